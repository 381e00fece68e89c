//! SlideGC demo driver
//!
//! Exercises the runtime through the classic collection scenarios and
//! reports survivor counts after each forced collection.
//!
//! Usage: slidegc [options]
//!   -h, --help      List options
//!   -v, --verbose   Log each collection (live bytes, heap size)
//!   --fixed         Use the fixed 1 MiB heap instead of the reallocating one
//!   --churn N       Iterations for the churn scenario (default 100000)

use slidegc::{GrowthPolicy, Runtime, RuntimeError};

/// Command line options
struct Options {
    /// Log collections (-v)
    verbose: bool,
    /// Heap growth policy (--fixed)
    policy: GrowthPolicy,
    /// Churn scenario iterations (--churn)
    churn_iterations: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            verbose: false,
            policy: GrowthPolicy::Reallocating,
            churn_iterations: 100_000,
        }
    }
}

fn print_help() {
    println!("usage: slidegc [options]");
    println!("-h  --help     list options");
    println!("-v  --verbose  log each collection (live bytes, heap size)");
    println!("    --fixed    use the fixed 1 MiB heap");
    println!("    --churn n  iterations for the churn scenario");
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut opts = Options::default();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--verbose" => {
                opts.verbose = true;
            }
            "--fixed" => {
                opts.policy = GrowthPolicy::Fixed;
            }
            "--churn" => {
                i += 1;
                if i >= args.len() {
                    return Err("--churn requires a value".to_string());
                }
                opts.churn_iterations = args[i]
                    .parse()
                    .map_err(|_| format!("invalid churn count: {}", args[i]))?;
            }
            _ => {
                return Err(format!("unknown option: {}", arg));
            }
        }
        i += 1;
    }

    Ok(opts)
}

fn main() {
    let opts = match parse_args() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use -h for help.");
            std::process::exit(1);
        }
    };

    if opts.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    if let Err(e) = run_scenarios(&opts) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_scenarios(opts: &Options) -> Result<(), RuntimeError> {
    stack_preservation(opts)?;
    dead_collection(opts)?;
    nested_graph(opts)?;
    cycle(opts)?;
    churn(opts)?;
    if opts.policy == GrowthPolicy::Reallocating {
        rooted_growth()?;
    }
    Ok(())
}

fn expect_live(rt: &Runtime, expected: usize) {
    let actual = rt.live_count();
    if actual == expected {
        println!("PASS: expected and found {} live cells.", expected);
    } else {
        eprintln!("expected {} live cells, found {}", expected, actual);
        std::process::exit(1);
    }
}

fn stack_preservation(opts: &Options) -> Result<(), RuntimeError> {
    println!("Scenario 1: objects on the stack are preserved.");
    let mut rt = Runtime::with_policy(opts.policy)?;
    rt.push_int(1)?;
    rt.push_int(2)?;

    rt.gc()?;
    expect_live(&rt, 2);
    Ok(())
}

fn dead_collection(opts: &Options) -> Result<(), RuntimeError> {
    println!("Scenario 2: unreached objects are collected.");
    let mut rt = Runtime::with_policy(opts.policy)?;
    rt.push_int(1)?;
    rt.push_int(2)?;
    rt.pop()?;
    rt.pop()?;

    rt.gc()?;
    expect_live(&rt, 0);
    Ok(())
}

fn nested_graph(opts: &Options) -> Result<(), RuntimeError> {
    println!("Scenario 3: nested objects are reached.");
    let mut rt = Runtime::with_policy(opts.policy)?;
    rt.push_int(1)?;
    rt.push_int(2)?;
    rt.push_pair()?;
    rt.push_int(3)?;
    rt.push_int(4)?;
    rt.push_pair()?;
    let outer = rt.push_pair()?;
    println!("  root: {}", rt.render(outer));

    rt.gc()?;
    expect_live(&rt, 7);
    Ok(())
}

fn cycle(opts: &Options) -> Result<(), RuntimeError> {
    println!("Scenario 4: cycles terminate the mark walk.");
    let mut rt = Runtime::with_policy(opts.policy)?;
    rt.push_int(1)?;
    rt.push_int(2)?;
    let a = rt.push_pair()?;
    rt.push_int(3)?;
    rt.push_int(4)?;
    let b = rt.push_pair()?;

    rt.set_tail(a, b).expect("a is a pair");
    rt.set_tail(b, a).expect("b is a pair");

    rt.gc()?;
    expect_live(&rt, 4);
    Ok(())
}

fn churn(opts: &Options) -> Result<(), RuntimeError> {
    println!(
        "Scenario 5: churn without retention, {} iterations.",
        opts.churn_iterations
    );
    let mut rt = Runtime::with_policy(opts.policy)?;
    for i in 0..opts.churn_iterations {
        for _ in 0..20 {
            rt.push_int(i as i64)?;
        }
        for _ in 0..20 {
            rt.pop()?;
        }
    }

    rt.gc()?;
    expect_live(&rt, 0);
    Ok(())
}

fn rooted_growth() -> Result<(), RuntimeError> {
    println!("Scenario 6: the heap grows around rooted survivors.");
    let mut rt = Runtime::new()?;
    for i in 0..100 {
        rt.push_int(i)?;
    }

    rt.gc()?;
    expect_live(&rt, 100);
    println!("  heap capacity: {} bytes", rt.heap_capacity());
    Ok(())
}
