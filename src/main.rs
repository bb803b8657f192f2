use clap::Parser;

use bandsweep::solver::comm::SingleProcessComm;
use bandsweep::solver::relax::{self, RelaxOutcome, RelaxParams};
use bandsweep::solver::runner;

/// Distributed Gauss-Seidel relaxation on a row-partitioned grid
#[derive(Parser)]
#[command(name = "bandsweep", version)]
struct Cli {
    /// Grid side length N (must be > 2)
    n: usize,

    /// Number of in-process participants
    #[arg(long, default_value_t = 1)]
    participants: usize,

    /// Iteration cap
    #[arg(long, default_value_t = relax::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Convergence threshold for the reduced epsilon
    #[arg(long, default_value_t = relax::DEFAULT_EPSILON)]
    epsilon: f64,

    /// Run as one MPI rank (start under mpirun; ignores --participants)
    #[cfg(feature = "distributed")]
    #[arg(long)]
    mpi: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let params = RelaxParams {
        max_iterations: cli.max_iterations,
        epsilon: cli.epsilon,
    };

    #[cfg(feature = "distributed")]
    if cli.mpi {
        use bandsweep::solver::comm::Communicator;
        use bandsweep::solver::comm_mpi::MpiComm;

        let _universe = mpi::initialize().unwrap_or_else(|| {
            eprintln!("MPI initialization failed");
            std::process::exit(1);
        });
        let comm = MpiComm::new();
        let outcome = relax::run(&comm, cli.n, &params).unwrap_or_else(|e| {
            eprintln!("bandsweep: {e}");
            comm.abort(1);
        });
        report(&outcome);
        return;
    }

    let outcome = if cli.participants == 1 {
        relax::run(&SingleProcessComm, cli.n, &params)
    } else {
        runner::run_threaded(cli.n, cli.participants, &params)
    }
    .unwrap_or_else(|e| {
        eprintln!("bandsweep: {e}");
        std::process::exit(1);
    });
    report(&outcome);
}

/// Print the run summary; only the reporting rank carries the checksum.
fn report(outcome: &RelaxOutcome) {
    if let Some(checksum) = outcome.checksum {
        println!(
            "iterations = {}   eps = {:e}",
            outcome.iterations, outcome.global_epsilon
        );
        println!("time = {:.6} sec", outcome.elapsed.as_secs_f64());
        println!("S = {checksum:.6}");
    }
}
