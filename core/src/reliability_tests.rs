use super::*;
use crate::config::{LookupType, PokeConfig};
use crate::scan_manager::ScanManager;
use std::time::{Duration, Instant};

fn quick_dead_config(subnet: &str) -> ScanConfig {
    ScanConfig {
        subnet: subnet.to_string(),
        port_list: "common".to_string(),
        t_multiplier: 0.01,
        task_scan_ports: false,
        lookup_type: vec![LookupType::Poke],
        poke_config: PokeConfig { timeout: 0.05, retries: 0 },
        ..ScanConfig::default()
    }
}

fn new_queue() -> Arc<ReliabilityQueue> {
    Arc::new(ReliabilityQueue::new(Arc::new(ScanManager::new())))
}

#[test]
fn enqueue_returns_one_id_per_repeat() {
    let queue = new_queue();
    let ids = queue.enqueue(quick_dead_config("192.0.2.10"), None, 3);
    assert_eq!(ids.len(), 3);
    assert_eq!(queue.get_status_counts().queued, 3);
}

#[test]
fn repeat_is_clamped_to_the_documented_range() {
    let queue = new_queue();
    assert_eq!(queue.enqueue(quick_dead_config("192.0.2.11"), None, 0).len(), 1);
    assert_eq!(queue.enqueue(quick_dead_config("192.0.2.12"), None, 1000).len(), 50);
}

#[test]
fn cancel_marks_a_queued_job_cancelled() {
    let queue = new_queue();
    let ids = queue.enqueue(quick_dead_config("192.0.2.13"), None, 1);
    assert!(queue.cancel(&ids[0]));

    let (job, _) = queue.job(&ids[0]).unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);

    let counts = queue.get_status_counts();
    assert_eq!(counts.cancelled, 1);
    assert_eq!(counts.queued, 0);
}

#[test]
fn cancel_returns_false_for_unknown_id() {
    let queue = new_queue();
    assert!(!queue.cancel("does-not-exist"));
}

#[test]
fn queue_position_counts_only_jobs_still_queued() {
    let queue = new_queue();
    let id_a = queue.enqueue(quick_dead_config("192.0.2.14"), None, 1).remove(0);
    let id_b = queue.enqueue(quick_dead_config("192.0.2.15"), None, 1).remove(0);

    let (_, pos_a) = queue.job(&id_a).unwrap();
    let (_, pos_b) = queue.job(&id_b).unwrap();
    assert_eq!(pos_a, 1);
    assert_eq!(pos_b, 2);
}

#[test]
fn worker_drains_queue_in_order_and_honors_cancellation() {
    let queue = new_queue();
    let handle = queue.spawn_worker();

    let id1 = queue.enqueue(quick_dead_config("192.0.2.20"), Some("job1".into()), 1).remove(0);
    let id2 = queue.enqueue(quick_dead_config("192.0.2.21"), Some("job2".into()), 1).remove(0);
    let id3 = queue.enqueue(quick_dead_config("192.0.2.22"), Some("job3".into()), 1).remove(0);

    assert!(queue.cancel(&id3));

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let counts = queue.get_status_counts();
        if counts.completed == 2 && counts.cancelled == 1 {
            break;
        }
        assert!(Instant::now() < deadline, "reliability queue did not drain in time: {counts:?}");
        std::thread::sleep(Duration::from_millis(20));
    }

    let counts = queue.get_status_counts();
    assert_eq!(counts, StatusCounts { queued: 0, running: 0, completed: 2, error: 0, cancelled: 1 });

    let (job1, _) = queue.job(&id1).unwrap();
    let (job2, _) = queue.job(&id2).unwrap();
    assert_eq!(job1.status, JobStatus::Completed);
    assert_eq!(job2.status, JobStatus::Completed);
    assert!(job1.result_snapshot.is_some());

    queue.shutdown();
    handle.join().unwrap();
}
