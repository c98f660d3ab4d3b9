use std::collections::VecDeque;
use std::time::{Duration, Instant};

use futures::channel::oneshot::Sender as OneshotSender;
use futures::task::Poll;

use zendriver_types::{Command, CommandResponse, Method, MethodId, Request, Response};

use crate::error::{CdpError, DeadlineExceeded, Result};
use zendriver_cdp::cdp::browser_protocol::page::NavigateParams;
use zendriver_cdp::cdp::browser_protocol::target::SessionId;

/// Messages used internally to communicate with the handler, which is
/// executed in the background task.
#[derive(Debug)]
pub(crate) struct CommandMessage<T = Result<Response>> {
    pub method: MethodId,
    pub session_id: Option<SessionId>,
    pub params: serde_json::Value,
    /// The sender who issued the command and is awaiting the response
    pub sender: OneshotSender<T>,
}

impl<T> CommandMessage<T> {
    pub fn new<C: Command>(cmd: C, sender: OneshotSender<T>) -> serde_json::Result<Self> {
        Ok(Self {
            method: cmd.identifier(),
            session_id: None,
            params: serde_json::to_value(cmd)?,
            sender,
        })
    }

    pub fn with_session<C: Command>(
        cmd: C,
        sender: OneshotSender<T>,
        session_id: Option<SessionId>,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            method: cmd.identifier(),
            session_id,
            params: serde_json::to_value(cmd)?,
            sender,
        })
    }

    /// Whether this command is a navigation the handler must hold back until
    /// the page finished loading.
    pub fn is_navigation(&self) -> bool {
        self.method == NavigateParams::IDENTIFIER
    }

    /// Splits off the waiter so the raw request can be submitted while the
    /// sender is parked elsewhere.
    pub fn split(self) -> (Request, OneshotSender<T>) {
        let req = match self.session_id {
            Some(session_id) => Request::with_session(self.method, self.params, session_id),
            None => Request::new(self.method, self.params),
        };
        (req, self.sender)
    }
}

impl<T> Method for CommandMessage<T> {
    fn identifier(&self) -> MethodId {
        self.method.clone()
    }
}

/// Deserializes the raw response into the typed response of the command that
/// produced it.
pub(crate) fn to_command_response<T: Command>(
    resp: Response,
    method: MethodId,
) -> Result<CommandResponse<T::Response>> {
    if let Some(res) = resp.result {
        let result = serde_json::from_value(res)?;
        Ok(CommandResponse {
            id: resp.id,
            result,
            method,
        })
    } else if let Some(err) = resp.error {
        Err(err.into())
    } else {
        Err(CdpError::NoResponse)
    }
}

/// A sequence of commands the target executes one after another, waiting for
/// each response before issuing the next.
#[derive(Debug)]
pub(crate) struct CommandChain {
    /// The commands to process: (method identifier, params)
    cmds: VecDeque<(MethodId, serde_json::Value)>,
    /// The last issued command we are currently waiting on for completion
    waiting: Option<(MethodId, Instant)>,
    /// The window a response after issuing a request must arrive in
    timeout: Duration,
}

impl CommandChain {
    /// Creates a new `CommandChain` from an `Iterator`.
    ///
    /// The order of the commands corresponds to the iterator's
    pub fn new<I>(cmds: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = (MethodId, serde_json::Value)>,
    {
        Self {
            cmds: cmds.into_iter().collect(),
            waiting: None,
            timeout,
        }
    }

    /// queue in another request
    pub fn push_back(&mut self, method: MethodId, params: serde_json::Value) {
        self.cmds.push_back((method, params))
    }

    /// Removes the waiting state if the identifier matches that of the last
    /// issued command
    pub fn received_response(&mut self, identifier: &str) -> bool {
        if self.waiting.as_ref().map(|(c, _)| c.as_ref()) == Some(identifier) {
            self.waiting.take();
            true
        } else {
            false
        }
    }

    /// Whether all commands have been processed.
    pub fn is_done(&self) -> bool {
        self.cmds.is_empty() && self.waiting.is_none()
    }

    /// Return the next command to process or `None` if done.
    /// If the response timed out an error is returned instead
    pub fn poll(
        &mut self,
        now: Instant,
    ) -> Poll<Option<Result<(MethodId, serde_json::Value), DeadlineExceeded>>> {
        if let Some((_, deadline)) = self.waiting.as_ref() {
            if now > *deadline {
                Poll::Ready(Some(Err(DeadlineExceeded::new(now, *deadline))))
            } else {
                Poll::Pending
            }
        } else if let Some((method, val)) = self.cmds.pop_front() {
            self.waiting = Some((method.clone(), now + self.timeout));
            Poll::Ready(Some(Ok((method, val))))
        } else {
            Poll::Ready(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot::channel as oneshot_channel;
    use zendriver_cdp::cdp::browser_protocol::page::EnableParams;
    use zendriver_types::CallId;

    #[test]
    fn command_chain_serializes_commands() {
        let now = Instant::now();
        let mut chain = CommandChain::new(
            vec![
                ("Page.enable".into(), serde_json::json!({})),
                ("Runtime.enable".into(), serde_json::json!({})),
            ],
            Duration::from_secs(30),
        );

        let (method, _) = match chain.poll(now) {
            Poll::Ready(Some(Ok(next))) => next,
            other => panic!("unexpected poll result: {other:?}"),
        };
        assert_eq!(method, "Page.enable");

        // not answered yet, the chain must hold
        assert!(chain.poll(now).is_pending());
        assert!(!chain.received_response("Runtime.enable"));
        assert!(chain.received_response("Page.enable"));

        let (method, _) = match chain.poll(now) {
            Poll::Ready(Some(Ok(next))) => next,
            other => panic!("unexpected poll result: {other:?}"),
        };
        assert_eq!(method, "Runtime.enable");
        assert!(chain.received_response("Runtime.enable"));
        assert!(matches!(chain.poll(now), Poll::Ready(None)));
        assert!(chain.is_done());
    }

    #[test]
    fn command_chain_reports_deadline() {
        let now = Instant::now();
        let mut chain = CommandChain::new(
            vec![("Page.enable".into(), serde_json::json!({}))],
            Duration::from_millis(10),
        );
        assert!(matches!(chain.poll(now), Poll::Ready(Some(Ok(_)))));
        let later = now + Duration::from_millis(50);
        assert!(matches!(chain.poll(later), Poll::Ready(Some(Err(_)))));
    }

    #[test]
    fn navigation_commands_are_detected() {
        let (tx, _rx) = oneshot_channel();
        let msg: CommandMessage = CommandMessage::new(NavigateParams::new("about:blank"), tx).unwrap();
        assert!(msg.is_navigation());

        let (tx, _rx) = oneshot_channel();
        let msg: CommandMessage = CommandMessage::new(EnableParams::default(), tx).unwrap();
        assert!(!msg.is_navigation());
    }

    #[test]
    fn to_command_response_maps_error_replies() {
        let resp = Response {
            id: CallId::new(1),
            result: None,
            error: Some(zendriver_types::Error {
                code: -32000,
                message: "boom".to_string(),
                data: None,
            }),
        };
        let err = to_command_response::<EnableParams>(resp, "Page.enable".into()).unwrap_err();
        assert!(matches!(err, CdpError::Chrome(_)));
    }
}
