// Creational Patterns: Singleton and Prototype
// Runs every singleton variant under contention, then compares shallow and
// deep cloning of a weekly log.

use std::collections::HashSet;
use std::sync::mpsc;

use colored::Colorize;
use tracing_subscriber::EnvFilter;

use creational_patterns::prototype::{Attachment, NotifyingLog, WeeklyLog};
use creational_patterns::singleton::{
    CheckedSingleton, EagerSingleton, HolderSingleton, LazySingleton, TryLazy,
};
use creational_patterns::{deep_clone, shallow_clone, DemoConfig, Snapshot};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn init_tracing(config: &DemoConfig) -> Result<(), BoxError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .try_init()?;

    Ok(())
}

// ============================================================================
// Singleton variants under contention
// ============================================================================

/// Calls `get_instance` from many threads at once and returns the distinct
/// addresses that were observed.
fn race_for_instance(config: &DemoConfig, get: fn() -> usize) -> HashSet<usize> {
    let barrier = std::sync::Barrier::new(config.threads);
    let mut seen = HashSet::new();

    crossbeam::thread::scope(|s| {
        let handles: Vec<_> = (0..config.threads)
            .map(|_| {
                s.spawn(|_| {
                    barrier.wait();
                    (0..config.calls_per_thread).map(|_| get()).collect::<HashSet<_>>()
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(addresses) => seen.extend(addresses),
                Err(_) => tracing::error!("worker thread panicked"),
            }
        }
    })
    .unwrap_or_else(|_| tracing::error!("thread scope panicked"));

    seen
}

fn report(name: &str, addresses: &HashSet<usize>, constructions: Option<usize>) {
    let verdict = if addresses.len() == 1 {
        "one instance".green()
    } else {
        format!("{} instances", addresses.len()).red()
    };

    match constructions {
        Some(count) => println!("  {name:<16} {verdict}, constructed {count}x"),
        None => println!("  {name:<16} {verdict}, built at load time"),
    }
}

fn singleton_examples(config: &DemoConfig) {
    println!(
        "{} threads x {} calls each",
        config.threads, config.calls_per_thread
    );

    let eager = race_for_instance(config, || EagerSingleton::get_instance() as *const _ as usize);
    report("eager", &eager, None);

    let locked = race_for_instance(config, || LazySingleton::get_instance() as *const _ as usize);
    report("locked lazy", &locked, Some(LazySingleton::constructions()));

    let checked = race_for_instance(config, || CheckedSingleton::get_instance() as *const _ as usize);
    report("double-checked", &checked, Some(CheckedSingleton::constructions()));

    let holder = race_for_instance(config, || HolderSingleton::get_instance() as *const _ as usize);
    report("holder", &holder, Some(HolderSingleton::constructions()));

    println!(
        "  serials: eager={} locked={} checked={} holder={}",
        EagerSingleton::get_instance().next_serial(),
        LazySingleton::get_instance().next_serial(),
        CheckedSingleton::get_instance().next_serial(),
        HolderSingleton::get_instance().next_serial(),
    );
}

fn fallible_example() {
    static PRINTER: TryLazy<String> = TryLazy::new();

    match PRINTER.try_get_instance(|| Err::<String, _>("printer offline")) {
        Ok(name) => println!("  unexpected printer: {name}"),
        Err(err) => println!("  first attempt: {}", err.to_string().yellow()),
    }

    match PRINTER.try_get_instance(|| Ok::<_, &str>("printer-1".to_string())) {
        Ok(name) => println!("  second attempt: {}", name.green()),
        Err(err) => println!("  second attempt failed: {}", err.to_string().red()),
    }
}

// ============================================================================
// Shallow vs deep clone
// ============================================================================

fn prototype_examples() -> Result<(), BoxError> {
    let template = WeeklyLog::new(
        "platform team",
        "week 12",
        "Finished the report module",
        Attachment::new("report.pdf"),
    );
    println!("  template: {template}");

    let shallow = shallow_clone(&template)?;
    let deep = deep_clone(&template)?;

    shallow.rename_attachment("renamed-through-shallow.pdf");

    println!(
        "  shallow shares attachment: {}",
        template.shares_attachment_with(&shallow)
    );
    println!(
        "  deep shares attachment:    {}",
        template.shares_attachment_with(&deep)
    );
    println!("  template attachment now:   {}", template.attachment_name());
    println!("  deep copy attachment:      {}", deep.attachment_name());

    let next = template.next_week("week 13", "Started the billing module")?;
    println!("  next week: {next}");

    let snapshot = Snapshot::capture(&template)?;
    println!("  snapshot: {} bytes of {}", snapshot.len(), snapshot.type_name());

    let (tx, _rx) = mpsc::channel();
    let notifying = NotifyingLog::new(template, tx);
    if let Err(err) = shallow_clone(&notifying) {
        println!("  notifying log, shallow: {}", err.to_string().yellow());
    }
    if let Err(err) = deep_clone(&notifying) {
        println!("  notifying log, deep:    {}", err.to_string().yellow());
    }

    Ok(())
}

fn main() -> Result<(), BoxError> {
    let config = DemoConfig::global()?;
    init_tracing(config)?;

    println!("{}", "Creational Patterns".bold());
    println!("===================\n");

    println!("=== Singleton Pattern ===");
    singleton_examples(config);
    println!();

    println!("=== Fallible Singleton ===");
    fallible_example();
    println!();

    println!("=== Prototype Pattern ===");
    prototype_examples()?;

    Ok(())
}
