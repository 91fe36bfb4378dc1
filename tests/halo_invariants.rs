use parking_lot::Mutex;
use poisson_slab::prelude::*;
use std::thread;

/// Wraps a communicator and records the peer of every point-to-point call.
struct RecordingComm<C> {
    inner: C,
    peers: Mutex<Vec<usize>>,
}

impl<C> RecordingComm<C> {
    fn new(inner: C) -> Self {
        Self {
            inner,
            peers: Mutex::new(Vec::new()),
        }
    }

    fn peers(&self) -> Vec<usize> {
        self.peers.lock().clone()
    }
}

impl<C: Communicator> Communicator for RecordingComm<C> {
    type SendHandle = C::SendHandle;
    type RecvHandle = C::RecvHandle;

    fn rank(&self) -> usize {
        self.inner.rank()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn isend(&self, peer: usize, tag: CommTag, buf: &[u8]) -> Self::SendHandle {
        self.peers.lock().push(peer);
        self.inner.isend(peer, tag, buf)
    }

    fn irecv(&self, peer: usize, tag: CommTag, len: usize) -> Self::RecvHandle {
        self.peers.lock().push(peer);
        self.inner.irecv(peer, tag, len)
    }

    fn all_reduce_sum(&self, local: f64) -> Result<f64, SolverError> {
        self.inner.all_reduce_sum(local)
    }
}

/// Top halo, first row, last row, bottom halo of one worker after one step.
type Edges = [Vec<f32>; 4];

fn edges(grid: &Grid) -> Edges {
    let n = grid.rows();
    [
        grid.interior_row(0).to_vec(),
        grid.interior_row(1).to_vec(),
        grid.interior_row(n).to_vec(),
        grid.interior_row(n + 1).to_vec(),
    ]
}

fn record_steps(
    cfg: &SolverConfig,
    workers: usize,
    steps: usize,
) -> (Vec<Vec<Edges>>, Vec<Vec<usize>>) {
    let group: Vec<_> = LocalComm::group(workers)
        .into_iter()
        .map(RecordingComm::new)
        .collect();
    let per_rank: Vec<Vec<Edges>> = thread::scope(|s| {
        let hs: Vec<_> = group
            .iter()
            .map(|comm| {
                s.spawn(move || {
                    let mut solver = JacobiSolver::new(cfg, comm).unwrap();
                    let mut seen = vec![edges(solver.field().current())];
                    for _ in 0..steps {
                        solver.step().unwrap();
                        seen.push(edges(solver.field().current()));
                    }
                    seen
                })
            })
            .collect();
        hs.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let peers = group.iter().map(|c| c.peers()).collect();
    (per_rank, peers)
}

fn source_case() -> SolverConfig {
    SolverConfig {
        rows: 12,
        cols: 7,
        spacing: 0.1,
        residual: 1e-30,
        max_iterations: 100,
        boundary: BoundaryValues {
            top: 1.0,
            bottom: -2.0,
            left: 10.0,
            right: 3.0,
        },
        initial: vec![PointValue::new(3, 4, 5.0), PointValue::new(4, 4, -5.0)],
        source: vec![PointValue::new(6, 2, 40.0), PointValue::new(7, 6, -40.0)],
        ..SolverConfig::default()
    }
}

#[test]
fn halos_mirror_neighbour_rows_after_every_exchange() {
    for schedule in [ExchangeSchedule::Nonblocking, ExchangeSchedule::Parity] {
        let cfg = SolverConfig {
            exchange: schedule,
            ..source_case()
        };
        let (per_rank, _) = record_steps(&cfg, 4, 6);
        for step in 0..=6 {
            for r in 0..3 {
                let lower = &per_rank[r][step];
                let upper = &per_rank[r + 1][step];
                assert_eq!(lower[3], upper[1], "bottom halo of {r} at step {step}");
                assert_eq!(upper[0], lower[2], "top halo of {} at step {step}", r + 1);
            }
            assert_eq!(per_rank[0][step][0], vec![1.0; 7]);
            assert_eq!(per_rank[3][step][3], vec![-2.0; 7]);
        }
    }
}

#[test]
fn edge_ranks_never_address_a_missing_neighbour() {
    let (_, peers) = record_steps(&source_case(), 3, 4);
    assert!(!peers[0].is_empty());
    assert!(peers[0].iter().all(|&p| p == 1));
    assert!(peers[1].iter().all(|&p| p == 0 || p == 2));
    assert!(peers[1].contains(&0) && peers[1].contains(&2));
    assert!(peers[2].iter().all(|&p| p == 1));
}

#[test]
fn single_worker_sends_no_messages() {
    let comm = RecordingComm::new(NoComm);
    let sol = solve(&source_case(), &comm).unwrap();
    assert!(sol.report.iterations > 0);
    assert!(comm.peers().is_empty());
}

/// Sends rows one value short.
struct TruncatingComm(LocalComm);

impl Communicator for TruncatingComm {
    type SendHandle = ();
    type RecvHandle = <LocalComm as Communicator>::RecvHandle;

    fn rank(&self) -> usize {
        self.0.rank()
    }

    fn size(&self) -> usize {
        self.0.size()
    }

    fn isend(&self, peer: usize, tag: CommTag, buf: &[u8]) -> Self::SendHandle {
        self.0.isend(peer, tag, &buf[..buf.len() - 4])
    }

    fn irecv(&self, peer: usize, tag: CommTag, len: usize) -> Self::RecvHandle {
        self.0.irecv(peer, tag, len)
    }

    fn all_reduce_sum(&self, local: f64) -> Result<f64, SolverError> {
        self.0.all_reduce_sum(local)
    }
}

#[test]
fn a_corrupt_peer_fails_the_whole_group() {
    let cfg = source_case();
    let group = LocalComm::group(2);
    let results: Vec<Result<Solution, SolverError>> = thread::scope(|s| {
        let good = s.spawn(|| {
            let r = solve(&cfg, &group[0]);
            if r.is_err() {
                group[0].abort();
            }
            r
        });
        let bad = s.spawn(|| {
            let comm = TruncatingComm(group[1].clone());
            let r = solve(&cfg, &comm);
            if r.is_err() {
                group[1].abort();
            }
            r
        });
        vec![good.join().unwrap(), bad.join().unwrap()]
    });
    assert!(matches!(
        results[0],
        Err(SolverError::CommError { neighbor: 1, .. })
    ));
    assert!(results[1].is_err());
}
