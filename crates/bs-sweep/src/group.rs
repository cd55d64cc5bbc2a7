//! Collective operations over a fixed group of workers.
//!
//! A [`ProcessGroup`] is a set of `size` ranks that all call the same
//! collectives in the same order, in the manner of an MPI communicator.  The
//! sweep needs only two: a broadcast of the parameter table from a root rank
//! and a gather of every rank's results back to it.
//!
//! [`LocalGroup`] provides the group in-process: one OS thread per rank,
//! connected by `std::sync::mpsc` channels.  A multi-host transport would
//! implement the same trait; nothing in the distributor depends on ranks
//! sharing memory.

use std::any::Any;
use std::cell::RefCell;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("process group must have at least one rank")]
    EmptyGroup,

    #[error("root rank {root} is outside a group of {size}")]
    InvalidRoot { root: usize, size: usize },

    #[error("broadcast root {root} supplied no value")]
    MissingRootValue { root: usize },

    #[error("rank {rank} disconnected before the collective completed")]
    Disconnected { rank: usize },

    #[error("message from rank {from} has an unexpected type")]
    TypeMismatch { from: usize },

    #[error("could not start rank {rank}: {source}")]
    Spawn { rank: usize, source: std::io::Error },

    #[error("rank {rank} panicked")]
    RankPanicked { rank: usize },
}

pub type GroupResult<T> = Result<T, GroupError>;

// ── ProcessGroup ──────────────────────────────────────────────────────────────

/// Rank-addressed collectives.  Every rank must call each collective, with
/// the same `root`, in the same order.
pub trait ProcessGroup {
    /// This worker's rank in `0..size()`.
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Send the root's `value` to every rank.  The root passes `Some`, other
    /// ranks pass `None`; all ranks return the root's value.
    fn broadcast<T: Clone + Send + 'static>(&self, root: usize, value: Option<T>) -> GroupResult<T>;

    /// Collect one value from every rank on `root`.  The root gets
    /// `Some(values)` in rank order; other ranks get `None`.
    fn gather<T: Send + 'static>(&self, root: usize, value: T) -> GroupResult<Option<Vec<T>>>;
}

// ── LocalGroup ────────────────────────────────────────────────────────────────

struct Envelope {
    from:    usize,
    payload: Box<dyn Any + Send>,
}

/// One rank of a [`LocalGroup`].  Owned by exactly one thread.
pub struct LocalMember {
    rank:    usize,
    size:    usize,
    inbox:   Receiver<Envelope>,
    /// Senders to every other rank; `None` at our own index so that the
    /// inbox disconnects once all peers have exited.
    peers:   Vec<Option<Sender<Envelope>>>,
    /// Messages received ahead of the collective that wants them.
    backlog: RefCell<Vec<Envelope>>,
}

/// Launcher for an in-process group of ranks.
pub struct LocalGroup;

impl LocalGroup {
    /// Build `size` connected members without starting any threads.
    pub fn members(size: usize) -> GroupResult<Vec<LocalMember>> {
        if size == 0 {
            return Err(GroupError::EmptyGroup);
        }

        let (senders, inboxes): (Vec<_>, Vec<_>) = (0..size).map(|_| mpsc::channel()).unzip();

        Ok(inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalMember {
                rank,
                size,
                inbox,
                peers: senders
                    .iter()
                    .enumerate()
                    .map(|(r, tx)| (r != rank).then(|| tx.clone()))
                    .collect(),
                backlog: RefCell::new(Vec::new()),
            })
            .collect())
    }

    /// Run `f` once per rank, each on its own thread, and return the results
    /// in rank order.  Blocks until every rank has returned.
    pub fn launch<F, R>(size: usize, f: F) -> GroupResult<Vec<R>>
    where
        F: Fn(LocalMember) -> R + Sync,
        R: Send,
    {
        let members = Self::members(size)?;
        debug!(size, "launching local process group");

        thread::scope(|s| {
            let f = &f;
            let mut handles = Vec::with_capacity(size);
            for member in members {
                let rank = member.rank;
                let handle = thread::Builder::new()
                    .name(format!("sweep-rank-{rank}"))
                    .spawn_scoped(s, move || f(member))
                    .map_err(|source| GroupError::Spawn { rank, source })?;
                handles.push(handle);
            }

            handles
                .into_iter()
                .enumerate()
                .map(|(rank, h)| h.join().map_err(|_| GroupError::RankPanicked { rank }))
                .collect()
        })
    }
}

impl LocalMember {
    fn check_root(&self, root: usize) -> GroupResult<()> {
        if root >= self.size {
            return Err(GroupError::InvalidRoot { root, size: self.size });
        }
        Ok(())
    }

    fn send_to(&self, rank: usize, payload: Box<dyn Any + Send>) -> GroupResult<()> {
        let tx = self.peers[rank].as_ref().ok_or(GroupError::Disconnected { rank })?;
        tx.send(Envelope { from: self.rank, payload })
            .map_err(|_| GroupError::Disconnected { rank })
    }

    /// Next message whose sender satisfies `accept`, taking the backlog
    /// first.  Other messages are parked in the backlog.
    fn recv_matching(&self, accept: impl Fn(usize) -> bool) -> GroupResult<Envelope> {
        {
            let mut backlog = self.backlog.borrow_mut();
            if let Some(pos) = backlog.iter().position(|env| accept(env.from)) {
                return Ok(backlog.remove(pos));
            }
        }
        loop {
            let env = self
                .inbox
                .recv()
                .map_err(|_| GroupError::Disconnected { rank: self.rank })?;
            if accept(env.from) {
                return Ok(env);
            }
            self.backlog.borrow_mut().push(env);
        }
    }
}

fn open<T: 'static>(env: Envelope) -> GroupResult<T> {
    let from = env.from;
    env.payload
        .downcast::<T>()
        .map(|b| *b)
        .map_err(|_| GroupError::TypeMismatch { from })
}

impl ProcessGroup for LocalMember {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn broadcast<T: Clone + Send + 'static>(&self, root: usize, value: Option<T>) -> GroupResult<T> {
        self.check_root(root)?;

        if self.rank == root {
            let value = value.ok_or(GroupError::MissingRootValue { root })?;
            for rank in (0..self.size).filter(|&r| r != root) {
                self.send_to(rank, Box::new(value.clone()))?;
            }
            Ok(value)
        } else {
            open(self.recv_matching(|from| from == root)?)
        }
    }

    fn gather<T: Send + 'static>(&self, root: usize, value: T) -> GroupResult<Option<Vec<T>>> {
        self.check_root(root)?;

        if self.rank != root {
            self.send_to(root, Box::new(value))?;
            return Ok(None);
        }

        let mut slots: Vec<Option<T>> = (0..self.size).map(|_| None).collect();
        slots[root] = Some(value);
        for _ in 1..self.size {
            let env = self.recv_matching(|from| slots[from].is_none())?;
            let from = env.from;
            slots[from] = Some(open(env)?);
        }

        // Every slot is filled: each receive above targeted an empty one.
        Ok(Some(slots.into_iter().flatten().collect()))
    }
}
