//! End-to-end scenarios driving [`Environment`] as a black box: build a
//! small topology and application set, run the dispatcher to completion,
//! and check the externally observable outcome (acceptance, rejection
//! reason, final resource usage, metrics counters).

use std::collections::HashMap;

use crate::config::Config;
use crate::constants::Resource;
use crate::environment::Environment;
use crate::resource::Position;

fn origin() -> Position {
    Position { x: 0.0, y: 0.0, z: 0.0 }
}

fn limit(cpu: f64, gpu: f64, mem: f64, disk: f64) -> HashMap<Resource, f64> {
    let mut l = HashMap::new();
    l.insert(Resource::Cpu, cpu);
    l.insert(Resource::Gpu, gpu);
    l.insert(Resource::Mem, mem);
    l.insert(Resource::Disk, disk);
    l
}

#[test]
fn single_process_single_device_happy_path() {
    let mut env = Environment::new(Config::default());
    let device = env.add_device(origin(), limit(8.0, 0.0, 8192.0, 1_024_000.0));
    env.recompute_routing();

    let app = env.add_application(1000, 1, 0.0);
    let proc = &mut env.applications.get_mut(&app).unwrap().processes[0];
    proc.resource_request.insert(Resource::Cpu, 1.0);
    proc.resource_request.insert(Resource::Mem, 512.0);
    proc.resource_request.insert(Resource::Disk, 1024.0);

    env.enqueue_arrival(app, device, 0);
    env.enqueue_final_report(2000);
    env.run();

    // DeployProc ran immediately (the requesting device is its own
    // preferred target at metric 0); usage accrues at t=0, then unwinds at
    // Undeploy (t = 0 + sync delay 10 + duration 1000 = 1010).
    assert_eq!(env.metrics.row_at(0).cpu_current, 1.0);
    assert_eq!(env.metrics.row_at(10).currently_hosted_apps, 1);
    assert_eq!(env.metrics.row_at(1010).currently_hosted_apps, 0);
    assert_eq!(env.get_device_by_id(device).unwrap().current_usage(Resource::Cpu), 0.0);

    let row = env.metrics.row_at(2000);
    assert_eq!(row.cumulative_app_arrival, 1);
    assert_eq!(row.cumulative_app_accepted, 1);
    assert_eq!(row.cumulative_app_rejected, 0);
}

#[test]
fn colocation_via_aggregation_reserves_no_bandwidth() {
    let mut env = Environment::new(Config::default());
    let device = env.add_device(origin(), limit(4.0, 0.0, 8192.0, 1_024_000.0));
    env.recompute_routing();

    let app = env.add_application(100, 2, 0.0);
    {
        let a = env.applications.get_mut(&app).unwrap();
        a.processes[0].resource_request.insert(Resource::Cpu, 2.0);
        a.processes[1].resource_request.insert(Resource::Cpu, 2.0);
        a.proc_links[0][1] = 10.0 * 1024.0;
        a.proc_links[1][0] = 10.0 * 1024.0;
    }

    env.enqueue_arrival(app, device, 0);
    env.enqueue_final_report(200);
    env.run();

    let row = env.metrics.row_at(200);
    assert_eq!(row.cumulative_app_accepted, 1);
    // Both processes land on the same device, so the link between them is
    // the trivial zero-length path: no bandwidth is ever reserved.
    assert_eq!(env.metrics.row_at(0).bw_current, 0.0);
}

#[test]
fn resource_rejection_exhausts_retries_with_devices_reason() {
    let mut env = Environment::new(Config::default());
    let device = env.add_device(origin(), limit(1.0, 0.0, 8192.0, 1_024_000.0));
    env.recompute_routing();

    let app = env.add_application(1000, 1, 0.0);
    env.applications.get_mut(&app).unwrap().processes[0].resource_request.insert(Resource::Cpu, 2.0);

    env.enqueue_arrival(app, device, 0);
    env.enqueue_final_report(1_000_000);
    env.run();

    assert_eq!(env.rejected_application_by_reason.get("devices"), Some(&vec![app]));
    let row = env.metrics.row_at(1_000_000);
    assert_eq!(row.cumulative_app_rejected, 1);
    assert_eq!(row.cumulative_app_accepted, 0);
}

#[test]
fn bandwidth_limited_link_rejects_with_links_reason() {
    let mut env = Environment::new(Config::default());
    // Both devices cap at 1 cpu, so the two processes (1 cpu each) cannot
    // co-locate and are forced onto separate devices connected by a single
    // link whose capacity is smaller than the inter-process demand.
    let d0 = env.add_device(origin(), limit(1.0, 0.0, 8192.0, 1_024_000.0));
    let d1 = env.add_device(origin(), limit(1.0, 0.0, 8192.0, 1_024_000.0));
    env.add_link(d0, d1, 100.0, 1.0);
    env.recompute_routing();

    let app = env.add_application(1000, 2, 0.0);
    {
        let a = env.applications.get_mut(&app).unwrap();
        a.processes[0].resource_request.insert(Resource::Cpu, 1.0);
        a.processes[1].resource_request.insert(Resource::Cpu, 1.0);
        a.proc_links[0][1] = 150.0;
        a.proc_links[1][0] = 150.0;
    }

    env.enqueue_arrival(app, d0, 0);
    env.enqueue_final_report(1_000_000);
    env.run();

    assert_eq!(env.rejected_application_by_reason.get("links"), Some(&vec![app]));
}

#[test]
fn undeploy_outranks_placement_at_equal_dispatch_time() {
    // Device has room for exactly one tenant. Application A's Undeploy is
    // timed to land at the same tick as application B's arrival; if
    // Undeploy (priority 1) dispatches before Placement (priority 2), B
    // finds the freed capacity and is accepted in a single attempt.
    let mut env = Environment::new(Config::default());
    let device = env.add_device(origin(), limit(1.0, 0.0, 8192.0, 1_024_000.0));
    env.recompute_routing();

    let app_a = env.add_application(990, 1, 0.0); // Sync at 10, Undeploy at 10 + 990 = 1000
    env.applications.get_mut(&app_a).unwrap().processes[0].resource_request.insert(Resource::Cpu, 1.0);
    let app_b = env.add_application(500, 1, 0.0);
    env.applications.get_mut(&app_b).unwrap().processes[0].resource_request.insert(Resource::Cpu, 1.0);

    env.enqueue_arrival(app_a, device, 0);
    env.enqueue_arrival(app_b, device, 1000);
    env.enqueue_final_report(3000);
    env.run();

    let row = env.metrics.row_at(3000);
    assert_eq!(row.cumulative_app_accepted, 2);
    assert_eq!(row.cumulative_app_rejected, 0);
}

#[test]
fn batch_window_accepts_up_to_capacity_and_rejects_the_rest() {
    let mut config = Config::default();
    config.batch = true;
    let mut env = Environment::new(config);
    // Room for exactly 3 tenants at once; the other 7 never free up since
    // their competitors never depart within the run.
    let device = env.add_device(origin(), limit(3.0, 0.0, 8192.0, 1_024_000.0));
    env.recompute_routing();

    let apps: Vec<_> = (0..10)
        .map(|_| {
            let app = env.add_application(10_000_000, 1, 0.0);
            env.applications.get_mut(&app).unwrap().processes[0].resource_request.insert(Resource::Cpu, 1.0);
            app
        })
        .collect();

    for &app in &apps {
        env.enqueue_arrival(app, device, 0);
    }
    // Past MAX_BATCH_TENTATIVES (15) windows of BATCH_WINDOW (1000) ticks
    // each, every undeliverable application has been rejected.
    env.enqueue_final_report(20_000);
    env.run();

    let row = env.metrics.row_at(20_000);
    assert_eq!(row.cumulative_app_accepted, 3);
    assert_eq!(row.cumulative_app_rejected, 7);
}
