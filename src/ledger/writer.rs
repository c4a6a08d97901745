//! Single writer task in front of a [`Ledger`]
//!
//! Workers never touch the ledger files directly. They send commands over a
//! bounded channel to one blocking task and wait for its acknowledgement, so a
//! record is on disk before the worker moves on to its next URL.

use crate::ledger::traits::{Ledger, LedgerError, LedgerResult};
use crate::ledger::{ExternalLinkRecord, PageRecord, UnextractableRecord, UnreachableRecord};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Capacity of the command channel
pub const WRITER_CHANNEL_CAPACITY: usize = 64;

type Ack = oneshot::Sender<LedgerResult<()>>;

enum Command {
    Page(PageRecord, Ack),
    ExternalLink(ExternalLinkRecord, Ack),
    Unextractable(UnextractableRecord, Ack),
    Unreachable(Vec<UnreachableRecord>, Ack),
}

/// Cloneable async front end of the writer task
#[derive(Clone)]
pub struct LedgerHandle {
    tx: mpsc::Sender<Command>,
}

impl LedgerHandle {
    pub async fn append_page_record(&self, record: PageRecord) -> LedgerResult<()> {
        self.request(|ack| Command::Page(record, ack)).await
    }

    pub async fn append_external_link(&self, record: ExternalLinkRecord) -> LedgerResult<()> {
        self.request(|ack| Command::ExternalLink(record, ack)).await
    }

    pub async fn append_unextractable(&self, record: UnextractableRecord) -> LedgerResult<()> {
        self.request(|ack| Command::Unextractable(record, ack)).await
    }

    pub async fn write_unreachable_snapshot(
        &self,
        records: Vec<UnreachableRecord>,
    ) -> LedgerResult<()> {
        self.request(|ack| Command::Unreachable(records, ack)).await
    }

    async fn request(&self, build: impl FnOnce(Ack) -> Command) -> LedgerResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(build(ack_tx))
            .await
            .map_err(|_| LedgerError::WriterClosed)?;
        ack_rx.await.map_err(|_| LedgerError::WriterClosed)?
    }
}

/// Moves `ledger` onto a blocking task and returns the handle feeding it
///
/// The task ends once every handle has been dropped; joining it yields the
/// ledger back.
pub fn spawn_writer<L>(ledger: L) -> (LedgerHandle, JoinHandle<L>)
where
    L: Ledger + 'static,
{
    let (tx, mut rx) = mpsc::channel(WRITER_CHANNEL_CAPACITY);

    let task = tokio::task::spawn_blocking(move || {
        let mut ledger = ledger;
        while let Some(command) = rx.blocking_recv() {
            let (result, ack) = match command {
                Command::Page(record, ack) => (ledger.append_page_record(&record), ack),
                Command::ExternalLink(record, ack) => (ledger.append_external_link(&record), ack),
                Command::Unextractable(record, ack) => (ledger.append_unextractable(&record), ack),
                Command::Unreachable(records, ack) => {
                    (ledger.write_unreachable_snapshot(&records), ack)
                }
            };

            if let Err(e) = &result {
                tracing::error!("Ledger write failed: {}", e);
            }
            // the requester may have gone away; the write itself is done
            let _ = ack.send(result);
        }
        tracing::debug!("Ledger writer shutting down");
        ledger
    });

    (LedgerHandle { tx }, task)
}
