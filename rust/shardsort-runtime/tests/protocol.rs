//! End-to-end runs of the distribute / sort / collect / merge protocol.

use shardsort_core::dataset;
use shardsort_core::plan::PartitionPlan;
use shardsort_runtime::group::{GroupContext, Rank};
use shardsort_runtime::protocol::{self, ProtocolError};
use shardsort_runtime::transport::{self, TransportError};
use std::thread;

/// Assert that `sorted` is an ascending permutation of `input`.
fn assert_sorted_permutation(input: &[i64], sorted: &[i64]) {
    assert_eq!(sorted.len(), input.len());
    assert!(dataset::is_sorted(sorted));
    assert_eq!(dataset::fingerprint(input), dataset::fingerprint(sorted));
}

#[test]
fn end_to_end_50_elements_2_ranks() {
    let input = dataset::generate(50, 0);
    let sorted = protocol::run_local(input.clone(), 2).unwrap();
    assert_sorted_permutation(&input, &sorted);
}

#[test]
fn end_to_end_50_elements_6_ranks() {
    let input = dataset::generate(50, 0);
    let sorted = protocol::run_local(input.clone(), 6).unwrap();
    assert_sorted_permutation(&input, &sorted);
}

#[test]
fn seeded_runs_are_reproducible() {
    let first_input = dataset::generate(50, 0);
    let second_input = dataset::generate(50, 0);
    assert_eq!(first_input, second_input);

    let first = protocol::run_local(first_input, 6).unwrap();
    let second = protocol::run_local(second_input, 6).unwrap();
    assert_eq!(first, second);
}

#[test]
fn single_rank_sorts_without_transport() {
    // A group of one spawns no worker threads and opens no links; the
    // coordinator sorts the whole array itself.
    let input = dataset::generate(33, 9);
    let sorted = protocol::run_local(input.clone(), 1).unwrap();
    assert_sorted_permutation(&input, &sorted);
}

#[test]
fn empty_dataset_yields_empty_result() {
    let sorted = protocol::run_local(Vec::new(), 6).unwrap();
    assert!(sorted.is_empty());
}

#[test]
fn more_ranks_than_elements() {
    // Ranks beyond the third receive an empty partition and still
    // participate in the round trip.
    let input = vec![5, 1, 3];
    let sorted = protocol::run_local(input.clone(), 8).unwrap();
    assert_eq!(sorted, vec![1, 3, 5]);
}

#[test]
fn large_run_with_duplicates() {
    let input = dataset::generate(1000, 1234);
    let sorted = protocol::run_local(input.clone(), 8).unwrap();
    assert_sorted_permutation(&input, &sorted);
}

#[test]
fn roles_compose_over_a_manual_star() {
    // Wire the group by hand instead of through run_local: the coordinator
    // and worker entry points are the whole protocol.
    let world = 4;
    let input = dataset::generate(101, 7);
    let plan = PartitionPlan::new(input.len(), world).unwrap();

    let (coordinator, workers) = transport::star(world);
    let mut handles = Vec::new();
    for endpoint in workers {
        let ctx = GroupContext {
            rank: endpoint.rank(),
            world,
            endpoint,
        };
        handles.push(thread::spawn(move || protocol::run_worker(&ctx)));
    }

    let ctx = GroupContext {
        rank: Rank::COORDINATOR,
        world,
        endpoint: coordinator,
    };
    let sorted = protocol::run_coordinator(&ctx, &plan, input.clone()).unwrap();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_sorted_permutation(&input, &sorted);
}

#[test]
fn oversized_return_buffer_is_a_protocol_error() {
    // A misbehaving peer that returns the wrong number of elements must
    // surface as an error, never as a silently truncated result.
    let world = 2;
    let plan = PartitionPlan::new(10, world).unwrap();
    let input = dataset::generate(10, 3);

    let (coordinator, mut workers) = transport::star(world);
    let rogue = workers.remove(0);
    let handle = thread::spawn(move || {
        let buf = rogue.recv_from(Rank::COORDINATOR).unwrap();
        // Send back one element too many.
        let mut out = buf;
        out.push(0);
        rogue.send(Rank::COORDINATOR, out).unwrap();
    });

    let ctx = GroupContext {
        rank: Rank::COORDINATOR,
        world,
        endpoint: coordinator,
    };
    let err = protocol::run_coordinator(&ctx, &plan, input).unwrap_err();
    assert_eq!(
        err,
        ProtocolError::Transport(TransportError::PayloadSize {
            from: Rank(1),
            expected: 5,
            actual: 6,
        })
    );
    handle.join().unwrap();
}

#[test]
fn vanished_worker_fails_the_run() {
    // A worker that exits before returning its partition must fail the
    // whole run with a communication error.
    let world = 3;
    let plan = PartitionPlan::new(9, world).unwrap();
    let input = dataset::generate(9, 5);

    let (coordinator, workers) = transport::star(world);
    let mut handles = Vec::new();
    for endpoint in workers {
        let rank = endpoint.rank();
        handles.push(thread::spawn(move || {
            // Rank 2 drops its endpoint without answering.
            if rank == Rank(2) {
                let _ = endpoint.recv_from(Rank::COORDINATOR);
                return;
            }
            let ctx = GroupContext {
                rank,
                world,
                endpoint,
            };
            let _ = protocol::run_worker(&ctx);
        }));
    }

    let ctx = GroupContext {
        rank: Rank::COORDINATOR,
        world,
        endpoint: coordinator,
    };
    let err = protocol::run_coordinator(&ctx, &plan, input).unwrap_err();
    assert_eq!(
        err,
        ProtocolError::Transport(TransportError::Disconnected { peer: Rank(2) })
    );
    for handle in handles {
        handle.join().unwrap();
    }
}
