//! One round of halo exchange between vertically adjacent slabs.
//!
//! After the exchange, the top halo (row `0`) of every worker with a `down`
//! neighbour equals that neighbour's last interior row, and the bottom halo
//! (row `rows + 1`) of every worker with an `up` neighbour equals that
//! neighbour's first interior row. Sides without a neighbour are skipped
//! entirely: no message primitive is invoked and the physical boundary value
//! in the halo is left untouched.
//!
//! Rows sent to `rank + 1` carry [`CommTag::UPWARD`], rows sent to `rank - 1`
//! carry [`CommTag::DOWNWARD`]. Only the interior columns travel.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{cast_slice, decode_row_into, row_bytes};
use crate::data::grid::Grid;
use crate::solver_error::SolverError;
use crate::topology::WorkerTopology;
use serde::{Deserialize, Serialize};

/// Ordering of sends and receives within one exchange round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExchangeSchedule {
    /// Post both receives, then both sends, then wait on everything.
    #[default]
    Nonblocking,
    /// Blocking operations; odd ranks send first and even ranks receive first.
    Parity,
}

fn land(peer: usize, msg: Option<Vec<u8>>, dst: &mut [f32]) -> Result<(), SolverError> {
    match msg {
        Some(bytes) => decode_row_into(peer, &bytes, dst),
        None => Err(SolverError::comm(
            peer,
            format!("halo row from rank {peer} never arrived"),
        )),
    }
}

/// Refresh both halo rows of `grid` from the neighbours named in `topology`.
pub fn exchange_halos<C: Communicator>(
    grid: &mut Grid,
    topology: &WorkerTopology,
    comm: &C,
    schedule: ExchangeSchedule,
) -> Result<(), SolverError> {
    let res = match schedule {
        ExchangeSchedule::Nonblocking => exchange_nonblocking(grid, topology, comm),
        ExchangeSchedule::Parity => exchange_parity(grid, topology, comm),
    };
    res.inspect_err(|e| log::warn!("[rank {}] halo exchange failed: {e}", topology.rank()))
}

fn exchange_nonblocking<C: Communicator>(
    grid: &mut Grid,
    topology: &WorkerTopology,
    comm: &C,
) -> Result<(), SolverError> {
    let len = row_bytes(grid.cols());
    let last = grid.rows();

    // 1) post all receives
    let from_down = topology
        .down()
        .map(|p| (p, comm.irecv(p, CommTag::UPWARD, len)));
    let from_up = topology
        .up()
        .map(|p| (p, comm.irecv(p, CommTag::DOWNWARD, len)));

    // 2) post all sends
    let mut pending_sends = Vec::with_capacity(2);
    if let Some(p) = topology.down() {
        pending_sends.push(comm.isend(p, CommTag::DOWNWARD, cast_slice(grid.interior_row(1))));
    }
    if let Some(p) = topology.up() {
        pending_sends.push(comm.isend(p, CommTag::UPWARD, cast_slice(grid.interior_row(last))));
    }

    // 3) wait for all recvs (but do not early-return)
    let mut maybe_err = None;
    if let Some((p, h)) = from_down {
        if let Err(e) = land(p, h.wait(), grid.interior_row_mut(0)) {
            maybe_err.get_or_insert(e);
        }
    }
    if let Some((p, h)) = from_up {
        if let Err(e) = land(p, h.wait(), grid.interior_row_mut(last + 1)) {
            maybe_err.get_or_insert(e);
        }
    }

    // 4) always drain all send handles before returning
    for send in pending_sends {
        let _ = send.wait();
    }

    match maybe_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn exchange_parity<C: Communicator>(
    grid: &mut Grid,
    topology: &WorkerTopology,
    comm: &C,
) -> Result<(), SolverError> {
    let len = row_bytes(grid.cols());
    let last = grid.rows();

    if topology.rank() % 2 == 1 {
        // Odd ranks send first.
        if let Some(down) = topology.down() {
            comm.send(down, CommTag::DOWNWARD, cast_slice(grid.interior_row(1)));
            let msg = comm.recv(down, CommTag::UPWARD, len);
            land(down, msg, grid.interior_row_mut(0))?;
        }
        if let Some(up) = topology.up() {
            comm.send(up, CommTag::UPWARD, cast_slice(grid.interior_row(last)));
            let msg = comm.recv(up, CommTag::DOWNWARD, len);
            land(up, msg, grid.interior_row_mut(last + 1))?;
        }
    } else {
        // Even ranks receive first.
        if let Some(down) = topology.down() {
            let msg = comm.recv(down, CommTag::UPWARD, len);
            land(down, msg, grid.interior_row_mut(0))?;
            comm.send(down, CommTag::DOWNWARD, cast_slice(grid.interior_row(1)));
        }
        if let Some(up) = topology.up() {
            let msg = comm.recv(up, CommTag::DOWNWARD, len);
            land(up, msg, grid.interior_row_mut(last + 1))?;
            comm.send(up, CommTag::UPWARD, cast_slice(grid.interior_row(last)));
        }
    }
    Ok(())
}
