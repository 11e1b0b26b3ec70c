use std::sync::mpsc::{self, Receiver, Sender};

pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// `GET` a section fragment. `url` may be relative to the page origin.
    FetchSection { request_id: RequestId, url: String },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    FetchDone {
        request_id: RequestId,
        url: String,
        body: String,
    },
    FetchError {
        request_id: RequestId,
        url: String,
        error: String,
    },
}

pub struct Bus {
    pub cmd_tx: Sender<CoreCommand>,
    pub evt_rx: Receiver<CoreEvent>,
    pub evt_tx: Sender<CoreEvent>, // shareable for runtimes
}

impl Bus {
    /// Returns the UI-side bus and the command receiver a runtime should drain.
    pub fn new() -> (Bus, Receiver<CoreCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (evt_tx, evt_rx) = mpsc::channel();
        (
            Bus {
                cmd_tx,
                evt_rx,
                evt_tx,
            },
            cmd_rx,
        )
    }
}
