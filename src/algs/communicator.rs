//! Thin façade over in-process or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* tagged with a [`CommTag`]; delivery
//! is FIFO per `(source, destination, tag)`. Receive handles are lazy: the
//! data only has to exist once `.wait()` is called, which is what makes the
//! "post every receive, then every send, then wait" schedule deadlock-free.
//!
//! Backends:
//! - [`NoComm`]: a group of one; every collective is the identity.
//! - [`LocalComm`]: a group of workers inside one process sharing a mailbox.
//! - `MpiComm` (feature `mpi-support`): one worker per MPI rank.

use crate::solver_error::SolverError;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Message tag distinguishing traffic between the same pair of ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(u16);

impl CommTag {
    /// Rows travelling from a rank to `rank + 1`.
    pub const UPWARD: CommTag = CommTag(0x0A01);
    /// Rows travelling from a rank to `rank - 1`.
    pub const DOWNWARD: CommTag = CommTag(0x0A02);

    pub const fn new(tag: u16) -> Self {
        CommTag(tag)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

/// Point-to-point and collective operations a worker needs (minimal by design).
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// This worker's 0-based rank.
    fn rank(&self) -> usize;
    /// Number of workers in the group.
    fn size(&self) -> usize;

    fn isend(&self, peer: usize, tag: CommTag, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive of `len` bytes from `peer`; the payload comes back from `wait`.
    fn irecv(&self, peer: usize, tag: CommTag, len: usize) -> Self::RecvHandle;

    /// Sum `local` over every worker; all workers get the same value.
    fn all_reduce_sum(&self, local: f64) -> Result<f64, SolverError>;

    /// Blocking send.
    fn send(&self, peer: usize, tag: CommTag, buf: &[u8]) {
        let _ = self.isend(peer, tag, buf).wait();
    }

    /// Blocking receive. `None` means the message can never arrive.
    fn recv(&self, peer: usize, tag: CommTag, len: usize) -> Option<Vec<u8>> {
        self.irecv(peer, tag, len).wait()
    }
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Single-worker communicator for serial runs.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn isend(&self, _peer: usize, _tag: CommTag, _buf: &[u8]) -> Self::SendHandle {}

    fn irecv(&self, _peer: usize, _tag: CommTag, _len: usize) -> Self::RecvHandle {}

    fn all_reduce_sum(&self, local: f64) -> Result<f64, SolverError> {
        Ok(local)
    }
}

// --- LocalComm: intra-process / multi-thread ---
type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Debug)]
struct ReduceSlot {
    generation: u64,
    arrived: usize,
    contributions: Vec<f64>,
    result: f64,
}

#[derive(Debug)]
struct Shared {
    size: usize,
    mailbox: DashMap<Key, VecDeque<Bytes>>,
    // Senders push under this lock so a receiver cannot miss the wakeup.
    posted: Mutex<()>,
    arrival: Condvar,
    reduce: Mutex<ReduceSlot>,
    reduced: Condvar,
    aborted: AtomicBool,
}

impl Shared {
    fn pop(&self, key: &Key) -> Option<Bytes> {
        self.mailbox.get_mut(key).and_then(|mut q| q.pop_front())
    }
}

/// One member of an in-process worker group.
///
/// All members created by [`LocalComm::group`] share a mailbox and a
/// reduction slot. Sends never block. Receives and reductions block until the
/// partner contributes or the group is [aborted](LocalComm::abort).
#[derive(Clone, Debug)]
pub struct LocalComm {
    rank: usize,
    shared: Arc<Shared>,
}

impl LocalComm {
    /// Create a group of `size` connected communicators, in rank order.
    pub fn group(size: usize) -> Vec<LocalComm> {
        let shared = Arc::new(Shared {
            size,
            mailbox: DashMap::new(),
            posted: Mutex::new(()),
            arrival: Condvar::new(),
            reduce: Mutex::new(ReduceSlot {
                generation: 0,
                arrived: 0,
                contributions: vec![0.0; size],
                result: 0.0,
            }),
            reduced: Condvar::new(),
            aborted: AtomicBool::new(false),
        });
        (0..size)
            .map(|rank| LocalComm {
                rank,
                shared: shared.clone(),
            })
            .collect()
    }

    /// Fail every pending and future receive or reduction in the group.
    pub fn abort(&self) {
        self.shared.aborted.store(true, Ordering::SeqCst);
        {
            let _g = self.shared.posted.lock();
            self.shared.arrival.notify_all();
        }
        let _g = self.shared.reduce.lock();
        self.shared.reduced.notify_all();
    }

    pub fn is_aborted(&self) -> bool {
        self.shared.aborted.load(Ordering::SeqCst)
    }
}

/// Pending receive on a [`LocalComm`]; the mailbox is polled on `wait`.
pub struct LocalHandle {
    shared: Arc<Shared>,
    key: Key,
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        let mut guard = self.shared.posted.lock();
        loop {
            if let Some(bytes) = self.shared.pop(&self.key) {
                return Some(bytes.to_vec());
            }
            if self.shared.aborted.load(Ordering::SeqCst) {
                return None;
            }
            self.shared.arrival.wait(&mut guard);
        }
    }
}

impl Communicator for LocalComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn isend(&self, peer: usize, tag: CommTag, buf: &[u8]) -> Self::SendHandle {
        let key = (self.rank, peer, tag.as_u16());
        let data = Bytes::copy_from_slice(buf);
        let _g = self.shared.posted.lock();
        self.shared.mailbox.entry(key).or_default().push_back(data);
        self.shared.arrival.notify_all();
    }

    fn irecv(&self, peer: usize, tag: CommTag, _len: usize) -> Self::RecvHandle {
        LocalHandle {
            shared: self.shared.clone(),
            key: (peer, self.rank, tag.as_u16()),
        }
    }

    fn all_reduce_sum(&self, local: f64) -> Result<f64, SolverError> {
        let shared = &self.shared;
        let mut slot = shared.reduce.lock();
        if shared.aborted.load(Ordering::SeqCst) {
            return Err(SolverError::ReductionFailed("worker group aborted".into()));
        }
        let generation = slot.generation;
        slot.contributions[self.rank] = local;
        slot.arrived += 1;
        if slot.arrived == shared.size {
            // Rank order keeps the sum bit-identical on every worker and every run.
            slot.result = slot.contributions.iter().sum();
            slot.arrived = 0;
            slot.generation += 1;
            shared.reduced.notify_all();
            return Ok(slot.result);
        }
        while slot.generation == generation {
            if shared.aborted.load(Ordering::SeqCst) {
                return Err(SolverError::ReductionFailed("worker group aborted".into()));
            }
            shared.reduced.wait(&mut slot);
        }
        Ok(slot.result)
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::collective::SystemOperation;
    use mpi::environment::Universe;
    use mpi::request::{Request, StaticScope};
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// One worker per MPI rank of the world communicator.
    pub struct MpiComm {
        pub world: SimpleCommunicator,
        pub rank: usize,
        size: usize,
        _universe: Universe,
    }

    impl MpiComm {
        /// Initialize MPI. Fails if MPI was already initialized in this process.
        pub fn new() -> Result<Self, SolverError> {
            let universe = mpi::initialize().ok_or_else(|| {
                SolverError::InvalidConfig("MPI is already initialized".into())
            })?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    /// In-flight `MPI_Isend`; owns its payload until completion.
    pub struct MpiSendHandle {
        req: Request<'static, [u8], StaticScope>,
        data: *mut [u8],
    }

    impl Wait for MpiSendHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.req.wait();
            // SAFETY: `data` came from `Box::leak` in `isend` and the request
            // that borrowed it has completed.
            unsafe { drop(Box::from_raw(self.data)) };
            None
        }
    }

    /// Receive matched by `(peer, tag)` when waited on.
    pub struct MpiRecvHandle {
        peer: i32,
        tag: i32,
    }

    impl Wait for MpiRecvHandle {
        fn wait(self) -> Option<Vec<u8>> {
            let world = SimpleCommunicator::world();
            let (data, _status) = world
                .process_at_rank(self.peer)
                .receive_vec_with_tag::<u8>(self.tag);
            Some(data)
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiSendHandle;
        type RecvHandle = MpiRecvHandle;

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: CommTag, buf: &[u8]) -> MpiSendHandle {
            let data: &'static mut [u8] = Box::leak(buf.to_vec().into_boxed_slice());
            let ptr: *mut [u8] = data;
            // SAFETY: the leaked box is only reclaimed after the request completes.
            let payload: &'static [u8] = unsafe { &*ptr };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, payload, tag.as_u16() as i32);
            MpiSendHandle { req, data: ptr }
        }

        fn irecv(&self, peer: usize, tag: CommTag, _len: usize) -> MpiRecvHandle {
            MpiRecvHandle {
                peer: peer as i32,
                tag: tag.as_u16() as i32,
            }
        }

        fn all_reduce_sum(&self, local: f64) -> Result<f64, SolverError> {
            let mut global = 0.0f64;
            self.world
                .all_reduce_into(&local, &mut global, SystemOperation::sum());
            Ok(global)
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
