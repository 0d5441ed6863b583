//! Tennis State Machine
//!
//! ```text
//! Initial ──tx "cq de #"──> InviteSent ──rx "<us> de #"──> InviteAccepted
//!    │                                                        │ tx "<dx> de <us>"
//!    └─rx "cq de #"─> InviteReceived ─tx "<dx> de #"─> InviteAnswered
//!                                                           │ rx "<dx> de <us>"
//! StartRoundSender <──────────────────────────────────────────┤
//!   │ tx "# #"                                                 v
//!   v                                                StartRoundReceiver
//! WaitForAnswer ──rx any──> StartRoundReceiver ──rx "#"──> ChallengeReceived
//!                                                   tx any ──> StartRoundSender
//! ```
//!
//! `<sk>` ends the game from any state; `<ka>` in `End` starts over.
//! Every state has one handler per direction; feedback to the operator
//! goes through the [`TennisClient`].

use core::fmt::Write;

use crate::tennis::word_buffer::{match_template, same_words, WordBuffer};
use crate::types::{bounded, Message, Word};

/// Token that ends the game
pub const END_TOKEN: &str = "<sk>";

/// Token that restarts the game after the end
pub const RESTART_TOKEN: &str = "<ka>";

/// Outputs of the game
pub trait TennisClient {
    /// Show a message to the operator
    fn print(&mut self, text: &str);
    /// Send a message to the other station
    fn send(&mut self, text: &str);
    /// Our answer to a challenge was right or wrong
    fn notify_result(&mut self, _passed: bool) {}
}

/// Game state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TennisState {
    /// Waiting for a `cq`
    #[default]
    Initial,
    /// We called cq
    InviteSent,
    /// We heard a cq
    InviteReceived,
    /// Our cq was answered
    InviteAccepted,
    /// We answered a cq
    InviteAnswered,
    /// Our turn to send a challenge
    StartRoundSender,
    /// Waiting for the other station's challenge
    StartRoundReceiver,
    /// Waiting for the answer to our challenge
    WaitForAnswer,
    /// Our turn to answer
    ChallengeReceived,
    /// Game over
    End,
}

impl TennisState {
    /// State name for logs and status lines
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initial => "Initial",
            Self::InviteSent => "InviteSent",
            Self::InviteReceived => "InviteReceived",
            Self::InviteAccepted => "InviteAccepted",
            Self::InviteAnswered => "InviteAnswered",
            Self::StartRoundSender => "StartRoundSender",
            Self::StartRoundReceiver => "StartRoundReceiver",
            Self::WaitForAnswer => "WaitForAnswer",
            Self::ChallengeReceived => "ChallengeReceived",
            Self::End => "End",
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TennisState {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.name());
    }
}

/// One player
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Player {
    /// Call sign
    pub call: Word,
    /// Points scored
    pub points: u16,
}

/// Session data
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameState {
    /// Our station
    pub us: Player,
    /// The other station
    pub dx: Player,
    /// Current challenge
    pub challenge: Message,
}

/// The game
#[derive(Clone, Debug, Default)]
pub struct TennisMachine {
    state: TennisState,
    game: GameState,
}

impl TennisMachine {
    /// Create a machine in `Initial`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> TennisState {
        self.state
    }

    /// Session data
    #[must_use]
    pub const fn game(&self) -> &GameState {
        &self.game
    }

    /// Start a new session
    pub fn start(&mut self, client: &mut dyn TennisClient) {
        self.state = TennisState::Initial;
        self.on_enter(client);
    }

    /// The operator finished keying a word; `buffer` holds what was keyed
    pub fn on_message_transmit(&mut self, buffer: &mut WordBuffer, client: &mut dyn TennisClient) {
        if buffer.ends_with(END_TOKEN) {
            buffer.clear();
            client.send(END_TOKEN);
            self.switch_to(TennisState::End, client);
            return;
        }
        match self.state {
            TennisState::Initial => self.transmit_initial(buffer, client),
            TennisState::InviteReceived => self.transmit_invite_received(buffer, client),
            TennisState::InviteAccepted => self.transmit_invite_accepted(buffer, client),
            TennisState::StartRoundSender => self.transmit_start_round(buffer, client),
            TennisState::ChallengeReceived => self.transmit_answer(buffer, client),
            TennisState::End => self.transmit_end(buffer, client),
            TennisState::WaitForAnswer => client.print("Please wait for dx to proceed!"),
            TennisState::InviteSent
            | TennisState::InviteAnswered
            | TennisState::StartRoundReceiver => client.print("Wait for DX to continue!"),
        }
    }

    /// A complete message was received from the other station
    pub fn on_message_receive(&mut self, message: &str, client: &mut dyn TennisClient) {
        debug!("tennis: {} received {}", self.state.name(), message);
        if match_template(message, END_TOKEN).is_some() {
            self.switch_to(TennisState::End, client);
            return;
        }
        match self.state {
            TennisState::Initial => self.receive_initial(message, client),
            TennisState::InviteSent => self.receive_invite_sent(message, client),
            TennisState::InviteAnswered => self.receive_invite_answered(message, client),
            TennisState::WaitForAnswer => self.receive_answer(message, client),
            TennisState::StartRoundReceiver => self.receive_challenge(message, client),
            TennisState::End => self.receive_end(message, client),
            TennisState::InviteReceived
            | TennisState::InviteAccepted
            | TennisState::StartRoundSender
            | TennisState::ChallengeReceived => {}
        }
    }

    fn switch_to(&mut self, next: TennisState, client: &mut dyn TennisClient) {
        info!("tennis: {} -> {}", self.state.name(), next.name());
        self.state = next;
        self.on_enter(client);
    }

    fn on_enter(&mut self, client: &mut dyn TennisClient) {
        match self.state {
            TennisState::Initial => self.game = GameState::default(),
            TennisState::InviteAnswered | TennisState::InviteSent => {
                client.print("Wait for DX to continue!");
            }
            TennisState::StartRoundSender => client.print("Give a word twice to send!"),
            TennisState::End => client.print("Game over - send <ka> to restart!"),
            _ => {}
        }
    }

    fn print_score(&self, client: &mut dyn TennisClient) {
        let mut line = Message::new();
        let _ = write!(line, "us: {} dx: {}", self.game.us.points, self.game.dx.points);
        client.print(&line);
    }

    fn exchange(first: &str, second: &str) -> Message {
        let mut pattern = Message::new();
        let _ = write!(pattern, "{first} de {second}");
        pattern
    }

    fn transmit_initial(&mut self, buffer: &mut WordBuffer, client: &mut dyn TennisClient) {
        let Some(us) = buffer.matches("cq de #") else {
            client.print("Send cq to continue!");
            return;
        };
        client.send(&buffer.get_and_clear());
        self.game.us.call = bounded(&us);
        self.switch_to(TennisState::InviteSent, client);
    }

    fn receive_initial(&mut self, message: &str, client: &mut dyn TennisClient) {
        if let Some(found) = match_template(message, "cq de #") {
            client.print("Received cq");
            self.game.dx.call = bounded(&found.capture);
            self.switch_to(TennisState::InviteReceived, client);
        }
    }

    fn transmit_invite_received(&mut self, buffer: &mut WordBuffer, client: &mut dyn TennisClient) {
        let pattern = Self::exchange(&self.game.dx.call, "#");
        let Some(us) = buffer.matches(&pattern) else {
            client.print("Answer call to continue!");
            return;
        };
        client.send(&buffer.get_and_clear());
        self.game.us.call = bounded(&us);
        self.switch_to(TennisState::InviteAnswered, client);
    }

    fn receive_invite_sent(&mut self, message: &str, client: &mut dyn TennisClient) {
        let pattern = Self::exchange(&self.game.us.call, "#");
        if let Some(found) = match_template(message, &pattern) {
            self.game.dx.call = bounded(&found.capture);
            self.switch_to(TennisState::InviteAccepted, client);
        }
    }

    fn transmit_invite_accepted(&mut self, buffer: &mut WordBuffer, client: &mut dyn TennisClient) {
        let pattern = Self::exchange(&self.game.dx.call, &self.game.us.call);
        if buffer.ends_with(&pattern) {
            client.print("The game commences.");
            buffer.clear();
            client.send(&pattern);
            self.switch_to(TennisState::StartRoundSender, client);
        } else {
            client.print("Answer with the calls to continue!");
        }
    }

    fn receive_invite_answered(&mut self, message: &str, client: &mut dyn TennisClient) {
        let pattern = Self::exchange(&self.game.dx.call, &self.game.us.call);
        if same_words(message, &pattern) {
            let mut line = Message::new();
            let _ = write!(
                line,
                "The game commences between {} and {}",
                self.game.dx.call, self.game.us.call
            );
            client.print(&line);
            self.switch_to(TennisState::StartRoundReceiver, client);
        }
    }

    fn transmit_start_round(&mut self, buffer: &mut WordBuffer, client: &mut dyn TennisClient) {
        let Some(challenge) = buffer.matches("# #") else {
            client.print("Sorry - try again to morse a word twice!");
            return;
        };
        self.game.challenge = challenge;
        client.send(&buffer.get_and_clear());
        self.switch_to(TennisState::WaitForAnswer, client);
    }

    fn receive_answer(&mut self, message: &str, client: &mut dyn TennisClient) {
        if same_words(message, &self.game.challenge) {
            self.game.dx.points += 1;
            self.print_score(client);
        }
        self.switch_to(TennisState::StartRoundReceiver, client);
    }

    fn receive_challenge(&mut self, message: &str, client: &mut dyn TennisClient) {
        if let Some(found) = match_template(message, "#") {
            self.game.challenge = found.capture;
            self.switch_to(TennisState::ChallengeReceived, client);
        }
    }

    fn transmit_answer(&mut self, buffer: &mut WordBuffer, client: &mut dyn TennisClient) {
        let passed = buffer.ends_with(&self.game.challenge);
        if passed {
            client.print("OK");
            self.game.us.points += 1;
            self.print_score(client);
        } else {
            client.print("ERR");
        }
        client.notify_result(passed);
        client.send(&buffer.get_and_clear());
        self.switch_to(TennisState::StartRoundSender, client);
    }

    fn transmit_end(&mut self, buffer: &mut WordBuffer, client: &mut dyn TennisClient) {
        if buffer.ends_with(RESTART_TOKEN) {
            buffer.clear();
            client.send(RESTART_TOKEN);
            self.switch_to(TennisState::Initial, client);
        }
    }

    fn receive_end(&mut self, message: &str, client: &mut dyn TennisClient) {
        if match_template(message, RESTART_TOKEN).is_some() {
            self.switch_to(TennisState::Initial, client);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        sent: heapless::Vec<Message, 8>,
        results: heapless::Vec<bool, 4>,
    }

    impl TennisClient for Recorder {
        fn print(&mut self, _text: &str) {}
        fn send(&mut self, text: &str) {
            let _ = self.sent.push(bounded(text));
        }
        fn notify_result(&mut self, passed: bool) {
            let _ = self.results.push(passed);
        }
    }

    #[test]
    fn end_token_from_any_state() {
        let mut machine = TennisMachine::new();
        let mut client = Recorder::default();
        machine.start(&mut client);
        let mut buf = WordBuffer::new();
        buf.add_word("tu <sk>");
        machine.on_message_transmit(&mut buf, &mut client);
        assert_eq!(machine.state(), TennisState::End);
        assert_eq!(client.sent[0].as_str(), END_TOKEN);
        assert!(buf.is_empty());
    }

    #[test]
    fn restart_resets_session() {
        let mut machine = TennisMachine::new();
        let mut client = Recorder::default();
        machine.start(&mut client);
        machine.on_message_receive("cq de XX1DX", &mut client);
        assert_eq!(machine.game().dx.call.as_str(), "XX1DX");
        machine.on_message_receive("<sk>", &mut client);
        assert_eq!(machine.state(), TennisState::End);
        machine.on_message_receive("<ka>", &mut client);
        assert_eq!(machine.state(), TennisState::Initial);
        assert!(machine.game().dx.call.is_empty());
    }

    #[test]
    fn answering_a_challenge() {
        let mut machine = TennisMachine::new();
        let mut client = Recorder::default();
        machine.start(&mut client);
        machine.on_message_receive("cq de XX1DX", &mut client);
        let mut buf = WordBuffer::new();
        buf.add_word("XX1DX de XX0YYY");
        machine.on_message_transmit(&mut buf, &mut client);
        assert_eq!(machine.state(), TennisState::InviteAnswered);
        machine.on_message_receive("XX1DX de XX0YYY", &mut client);
        assert_eq!(machine.state(), TennisState::StartRoundReceiver);
        machine.on_message_receive("tree tree", &mut client);
        assert_eq!(machine.state(), TennisState::ChallengeReceived);
        buf.add_word("tree");
        machine.on_message_transmit(&mut buf, &mut client);
        assert_eq!(machine.state(), TennisState::StartRoundSender);
        assert_eq!(machine.game().us.points, 1);
        assert_eq!(client.results.as_slice(), &[true]);
    }
}
