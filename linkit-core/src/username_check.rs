//! Username claim field: synchronous format validation plus a debounced,
//! cancellable availability check.
//!
//! A [`UsernameCheck`] owns exactly one debounce timer slot and one request
//! slot. Every edit cancels the timer and the outstanding request before
//! anything new is scheduled, and results are applied under the same lock that
//! cancellation takes, so a response for an older value can never land on the
//! state of a newer one.

use crate::availability::{AvailabilityClient, CheckError};
use crate::types::CheckUsernameResponse;
use crate::validation::validate_username;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Quiet period after the last edit before the network is asked.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

pub const TAKEN_MESSAGE: &str = "Username is taken";
pub const CHECK_FAILED_MESSAGE: &str = "Unable to check availability. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckPhase {
    /// Nothing typed yet (or reset)
    #[default]
    Idle,
    /// Format validation failed; no request scheduled
    Invalid,
    /// Valid format, waiting for the input to go quiet
    Debouncing,
    /// Request outstanding
    Checking,
    Available,
    Unavailable,
    /// Request failed for a reason other than cancellation
    CheckFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsernameCheckState {
    pub value: String,
    pub is_valid: bool,
    pub is_checking: bool,
    pub is_available: Option<bool>,
    pub error: Option<String>,
    pub phase: CheckPhase,
}

impl UsernameCheckState {
    /// Whether a claim/sign-up form may be submitted with this value.
    pub fn can_submit(&self) -> bool {
        self.is_valid && self.is_available == Some(true) && !self.is_checking
    }
}

#[derive(Default)]
struct Slots {
    state: UsernameCheckState,
    /// Pending debounce timer
    timer: Option<CancellationToken>,
    /// Outstanding availability request
    request: Option<CancellationToken>,
}

impl Slots {
    fn cancel_timer(&mut self) {
        if let Some(t) = self.timer.take() {
            t.cancel();
        }
    }

    fn cancel_request(&mut self) {
        if let Some(r) = self.request.take() {
            r.cancel();
        }
    }
}

struct Shared {
    slots: Mutex<Slots>,
    client: Arc<dyn AvailabilityClient>,
    debounce: Duration,
    /// Parent of every timer and request token; cancelled on drop.
    root: CancellationToken,
    tx: watch::Sender<UsernameCheckState>,
}

impl Shared {
    fn publish(&self, state: &UsernameCheckState) {
        self.tx.send_replace(state.clone());
    }

    /// Debounce timer fired: take over the request slot and ask the client.
    async fn run_check(&self, username: String, timer: CancellationToken) {
        let request = {
            let mut slots = self.slots.lock();
            if timer.is_cancelled() {
                return;
            }
            slots.timer = None;
            slots.cancel_request();

            let request = self.root.child_token();
            slots.request = Some(request.clone());

            let st = &mut slots.state;
            st.is_checking = true;
            st.is_available = None;
            st.error = None;
            st.phase = CheckPhase::Checking;
            self.publish(st);

            request
        };

        tracing::debug!(username = %username, "checking username availability");
        let outcome = self.client.check(&username, &request).await;

        let mut slots = self.slots.lock();
        if request.is_cancelled() {
            tracing::trace!(username = %username, "discarding superseded availability result");
            return;
        }
        if matches!(outcome, Err(CheckError::Cancelled)) {
            return;
        }
        slots.request = None;

        apply_outcome(&mut slots.state, outcome);
        self.publish(&slots.state);
    }
}

fn apply_outcome(st: &mut UsernameCheckState, outcome: Result<CheckUsernameResponse, CheckError>) {
    st.is_checking = false;
    match outcome {
        Ok(resp) if resp.available => {
            st.is_available = Some(true);
            st.error = None;
            st.phase = CheckPhase::Available;
        }
        Ok(resp) => {
            st.is_available = Some(false);
            st.error = Some(resp.message.unwrap_or_else(|| TAKEN_MESSAGE.to_string()));
            st.phase = CheckPhase::Unavailable;
        }
        Err(e) => {
            tracing::warn!(error = %e, value = %st.value, "username availability check failed");
            st.is_available = Some(false);
            st.error = Some(CHECK_FAILED_MESSAGE.to_string());
            st.phase = CheckPhase::CheckFailed;
        }
    }
}

/// Debounce controller for one username input.
///
/// Must be used from within a tokio runtime: scheduling a check spawns a task.
/// Dropping the controller cancels the pending timer and the outstanding request.
pub struct UsernameCheck {
    shared: Arc<Shared>,
}

impl UsernameCheck {
    pub fn new(client: Arc<dyn AvailabilityClient>) -> Self {
        Self::with_debounce(client, DEBOUNCE_DELAY)
    }

    pub fn with_debounce(client: Arc<dyn AvailabilityClient>, debounce: Duration) -> Self {
        let (tx, _) = watch::channel(UsernameCheckState::default());
        Self {
            shared: Arc::new(Shared {
                slots: Mutex::new(Slots::default()),
                client,
                debounce,
                root: CancellationToken::new(),
                tx,
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> UsernameCheckState {
        self.shared.slots.lock().state.clone()
    }

    /// Receives every state change.
    pub fn subscribe(&self) -> watch::Receiver<UsernameCheckState> {
        self.shared.tx.subscribe()
    }

    pub fn debounce(&self) -> Duration {
        self.shared.debounce
    }

    /// Input changed. Updates the state synchronously and, for a well-formed
    /// value, schedules an availability check after the debounce period.
    pub fn on_change(&self, value: impl Into<String>) {
        let value = value.into();
        let mut slots = self.shared.slots.lock();

        slots.cancel_timer();
        // The outstanding request belongs to an older value.
        slots.cancel_request();

        let st = &mut slots.state;
        st.value = value.clone();
        st.is_available = None;
        st.is_checking = false;
        st.error = None;

        if let Err(e) = validate_username(&value) {
            st.is_valid = false;
            st.error = Some(e.to_string());
            st.phase = CheckPhase::Invalid;
            self.shared.publish(st);
            return;
        }

        st.is_valid = true;
        st.phase = CheckPhase::Debouncing;
        self.shared.publish(st);

        let timer = self.shared.root.child_token();
        slots.timer = Some(timer.clone());
        drop(slots);

        let shared = self.shared.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = timer.cancelled() => return,
                () = tokio::time::sleep(shared.debounce) => {}
            }
            shared.run_check(value, timer).await;
        });
    }

    /// Cancels everything in flight and restores the initial state.
    pub fn reset(&self) {
        let mut slots = self.shared.slots.lock();
        slots.cancel_timer();
        slots.cancel_request();
        slots.state = UsernameCheckState::default();
        self.shared.publish(&slots.state);
    }
}

impl Drop for UsernameCheck {
    fn drop(&mut self) {
        self.shared.root.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    #[derive(Clone)]
    enum Reply {
        Answer(CheckUsernameResponse),
        Fail,
    }

    /// Records every call and answers after `latency`. With `honor_cancel`
    /// off it keeps going after cancellation, like a server that ignores aborts.
    struct ScriptedClient {
        calls: Mutex<Vec<String>>,
        replies: HashMap<String, Reply>,
        latency: Duration,
        honor_cancel: bool,
    }

    impl ScriptedClient {
        fn new(latency: Duration) -> Self {
            Self { calls: Mutex::new(vec![]), replies: HashMap::new(), latency, honor_cancel: true }
        }

        fn reply(mut self, name: &str, reply: Reply) -> Self {
            self.replies.insert(name.to_string(), reply);
            self
        }

        fn ignoring_cancel(mut self) -> Self {
            self.honor_cancel = false;
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl AvailabilityClient for ScriptedClient {
        async fn check(&self, username: &str, cancel: &CancellationToken) -> Result<CheckUsernameResponse, CheckError> {
            self.calls.lock().push(username.to_string());

            if self.honor_cancel {
                tokio::select! {
                    () = cancel.cancelled() => return Err(CheckError::Cancelled),
                    () = tokio::time::sleep(self.latency) => {}
                }
            } else {
                tokio::time::sleep(self.latency).await;
            }

            match self.replies.get(username) {
                Some(Reply::Answer(r)) => Ok(r.clone()),
                Some(Reply::Fail) => Err(CheckError::Transport("connection reset".into())),
                None => Ok(CheckUsernameResponse::available("Username is available")),
            }
        }
    }

    fn controller(client: &Arc<ScriptedClient>) -> UsernameCheck {
        UsernameCheck::new(client.clone())
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn starts_idle() {
        let client = Arc::new(ScriptedClient::new(Duration::from_millis(100)));
        let check = controller(&client);

        assert_eq!(check.state(), UsernameCheckState::default());
        assert_eq!(check.state().phase, CheckPhase::Idle);
        assert!(!check.state().can_submit());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_input_never_reaches_network() {
        let client = Arc::new(ScriptedClient::new(Duration::from_millis(100)));
        let check = controller(&client);

        check.on_change("a");
        let st = check.state();
        assert!(!st.is_valid);
        assert_eq!(st.is_available, None);
        assert_eq!(st.error.as_deref(), Some("Username must be at least 3 characters"));
        assert_eq!(st.phase, CheckPhase::Invalid);

        sleep_ms(2_000).await;
        assert!(client.calls().is_empty());
        assert_eq!(check.state().phase, CheckPhase::Invalid);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_typing_coalesces_into_one_call() {
        let client = Arc::new(ScriptedClient::new(Duration::from_millis(100)));
        let check = controller(&client);

        check.on_change("ab");
        sleep_ms(100).await;
        check.on_change("abc");
        sleep_ms(200).await;
        check.on_change("abcd");
        assert_eq!(check.state().phase, CheckPhase::Debouncing);

        sleep_ms(499).await;
        assert!(client.calls().is_empty());

        sleep_ms(1_000).await;
        assert_eq!(client.calls(), vec!["abcd".to_string()]);
        let st = check.state();
        assert_eq!(st.value, "abcd");
        assert_eq!(st.is_available, Some(true));
        assert_eq!(st.phase, CheckPhase::Available);
        assert!(st.can_submit());
    }

    #[tokio::test(start_paused = true)]
    async fn valid_then_invalid_edit_cancels_scheduled_check() {
        let client = Arc::new(ScriptedClient::new(Duration::from_millis(100)));
        let check = controller(&client);

        check.on_change("abc");
        sleep_ms(300).await;
        check.on_change("ab");

        sleep_ms(2_000).await;
        assert!(client.calls().is_empty());
        let st = check.state();
        assert!(!st.is_valid);
        assert_eq!(st.is_available, None);
    }

    #[tokio::test(start_paused = true)]
    async fn checking_state_clears_availability() {
        let client = Arc::new(ScriptedClient::new(Duration::from_millis(1_000)));
        let check = controller(&client);

        check.on_change("alice");
        sleep_ms(600).await;

        let st = check.state();
        assert!(st.is_checking);
        assert_eq!(st.is_available, None);
        assert_eq!(st.error, None);
        assert_eq!(st.phase, CheckPhase::Checking);
        assert!(!st.can_submit());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_result_is_never_applied() {
        // alice answers "available" even after being cancelled
        let client = Arc::new(
            ScriptedClient::new(Duration::from_millis(1_000))
                .reply("alice2", Reply::Answer(CheckUsernameResponse::unavailable("Username is already taken")))
                .ignoring_cancel(),
        );
        let check = controller(&client);

        check.on_change("alice");
        sleep_ms(600).await; // alice in flight until t=1500
        assert!(check.state().is_checking);

        check.on_change("alice2");
        sleep_ms(600).await; // t=1200: alice2 in flight until t=2100
        assert_eq!(client.calls(), vec!["alice".to_string(), "alice2".to_string()]);

        sleep_ms(400).await; // t=1600: alice resolved, must be ignored
        let st = check.state();
        assert_eq!(st.value, "alice2");
        assert!(st.is_checking);
        assert_eq!(st.is_available, None);

        sleep_ms(1_000).await;
        let st = check.state();
        assert!(!st.is_checking);
        assert_eq!(st.is_available, Some(false));
        assert_eq!(st.error.as_deref(), Some("Username is already taken"));
    }

    #[tokio::test(start_paused = true)]
    async fn edit_during_request_drops_checking_indicator() {
        let client = Arc::new(ScriptedClient::new(Duration::from_millis(1_000)));
        let check = controller(&client);

        check.on_change("alice");
        sleep_ms(600).await;
        assert!(check.state().is_checking);

        check.on_change("al");
        let st = check.state();
        assert!(!st.is_checking);
        assert_eq!(st.phase, CheckPhase::Invalid);

        sleep_ms(2_000).await;
        assert_eq!(check.state().is_available, None);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_while_in_flight() {
        let client = Arc::new(ScriptedClient::new(Duration::from_millis(1_000)).ignoring_cancel());
        let check = controller(&client);
        let mut rx = check.subscribe();

        check.on_change("alice");
        sleep_ms(600).await;
        assert!(check.state().is_checking);

        check.reset();
        assert_eq!(check.state(), UsernameCheckState::default());
        rx.borrow_and_update();

        sleep_ms(2_000).await;
        assert_eq!(check.state(), UsernameCheckState::default());
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn taken_name_end_to_end() {
        let client = Arc::new(ScriptedClient::new(Duration::from_millis(50)).reply(
            "valid_name",
            Reply::Answer(CheckUsernameResponse::unavailable("Username is already taken")),
        ));
        let check = controller(&client);

        check.on_change("a");
        assert_eq!(check.state().error.as_deref(), Some("Username must be at least 3 characters"));

        check.on_change("valid_name");
        let st = check.state();
        assert!(st.is_valid);
        assert_eq!(st.error, None);

        sleep_ms(1_000).await;
        assert_eq!(client.calls(), vec!["valid_name".to_string()]);
        let st = check.state();
        assert_eq!(st.is_available, Some(false));
        assert_eq!(st.error.as_deref(), Some("Username is already taken"));
        assert!(!st.is_checking);
        assert_eq!(st.phase, CheckPhase::Unavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_without_message_uses_default() {
        let client = Arc::new(ScriptedClient::new(Duration::from_millis(50)).reply(
            "bob123",
            Reply::Answer(CheckUsernameResponse { available: false, message: None }),
        ));
        let check = controller(&client);

        check.on_change("bob123");
        sleep_ms(1_000).await;
        assert_eq!(check.state().error.as_deref(), Some(TAKEN_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_degrades_to_message() {
        let client = Arc::new(ScriptedClient::new(Duration::from_millis(50)).reply("carol", Reply::Fail));
        let check = controller(&client);

        check.on_change("carol");
        sleep_ms(1_000).await;

        let st = check.state();
        assert!(!st.is_checking);
        assert_eq!(st.is_available, Some(false));
        assert_eq!(st.error.as_deref(), Some(CHECK_FAILED_MESSAGE));
        assert_eq!(st.phase, CheckPhase::CheckFailed);

        // No automatic retry.
        sleep_ms(5_000).await;
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_checking_then_result() {
        let client = Arc::new(ScriptedClient::new(Duration::from_millis(100)));
        let check = controller(&client);
        let mut rx = check.subscribe();

        check.on_change("dave");
        assert_eq!(rx.borrow_and_update().phase, CheckPhase::Debouncing);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().phase, CheckPhase::Checking);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().phase, CheckPhase::Available);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_outstanding_request() {
        let client = Arc::new(ScriptedClient::new(Duration::from_millis(1_000)));
        let check = controller(&client);
        let mut rx = check.subscribe();

        check.on_change("erin");
        sleep_ms(600).await;
        rx.borrow_and_update();
        drop(check);

        sleep_ms(2_000).await;
        // Sender is gone with the controller; nothing was published after drop.
        assert!(rx.has_changed().is_err());
        assert_eq!(client.calls(), vec!["erin".to_string()]);
    }
}
