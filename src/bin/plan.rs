//! Planning Binary
//!
//! Solve a Dec-POMDP with GMAA* and print the resulting joint policy.
//!
//! Options: --problem, --settings, --horizon, --solver, --exact, --k, --cluster, --heuristic, --depth, --simulate

use anyhow::Context;
use clap::Parser;
use clap::ValueEnum;
use gmaa::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Estimate {
    Qmdp,
    Qpomdp,
    Qbg,
    Qhybrid,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// `tiger`, or a path to a JSON model
    #[arg(long, default_value = "tiger")]
    problem: String,
    /// JSON settings file; flags below override it
    #[arg(long)]
    settings: Option<std::path::PathBuf>,
    #[arg(long)]
    horizon: Option<usize>,
    /// bf, bnb, am, ce, mp or random
    #[arg(long)]
    solver: Option<String>,
    /// Optimal MAA* search instead of k-best
    #[arg(long, conflicts_with = "k")]
    exact: bool,
    #[arg(long)]
    k: Option<usize>,
    #[arg(long)]
    incremental: bool,
    /// Merge equivalent observation histories in every stage game
    #[arg(long)]
    cluster: bool,
    #[arg(long)]
    deadline: Option<f64>,
    #[arg(long)]
    restarts: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value = "qpomdp")]
    heuristic: Estimate,
    /// Stages of QBG backups before `qhybrid` falls back to QMDP
    #[arg(long, default_value_t = 2)]
    depth: usize,
    /// Episodes of Monte Carlo validation after planning
    #[arg(long, default_value_t = 0)]
    simulate: usize,
}

impl Args {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => serde_json::from_str(
                &std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
            )
            .with_context(|| format!("parsing {}", path.display()))?,
            None => Settings::default(),
        };
        if let Some(horizon) = self.horizon {
            settings.horizon = horizon;
        }
        if let Some(solver) = &self.solver {
            settings.solver = solver.parse()?;
        }
        if self.exact {
            settings.variant = Variant::Exact;
        }
        if let Some(k) = self.k {
            settings.variant = Variant::KBest { k };
        }
        if self.incremental {
            settings.expansion = Expansion::Incremental;
        }
        if self.cluster {
            settings.cluster = true;
        }
        if let Some(deadline) = self.deadline {
            settings.deadline = Some(deadline);
        }
        if let Some(restarts) = self.restarts {
            settings.restarts = restarts;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        Ok(settings)
    }
    fn problem(&self) -> anyhow::Result<DecPomdp> {
        match self.problem.as_str() {
            "tiger" => Ok(DecPomdp::tiger()),
            path => {
                let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
                let problem = serde_json::from_str::<DecPomdp>(&text).with_context(|| format!("parsing {}", path))?;
                problem.validate()?;
                Ok(problem)
            }
        }
    }
}

fn run<H, F>(args: &Args, problem: DecPomdp, settings: Settings, heuristic: F) -> anyhow::Result<()>
where
    H: Heuristic,
    F: FnOnce(&DecPomdp, usize) -> gmaa::Result<H>,
{
    let mut planner = Planner::new(problem, settings)?;
    let start = std::time::Instant::now();
    let h = heuristic(planner.problem(), planner.horizon())?;
    log::info!("{:?} heuristic ready in {:.3?}", args.heuristic, start.elapsed());
    planner.inject(h)?;
    let outcome = planner.plan()?.clone();
    println!("{}", outcome);
    if let Some(policy) = outcome.policy.as_ref() {
        let histories = Histories::new(planner.problem(), planner.horizon())?;
        describe(policy, &histories);
        if args.simulate > 0 {
            let ref mut rng = SmallRng::seed_from_u64(planner.settings().seed);
            let simulation = simulate(planner.problem(), policy, planner.horizon(), args.simulate, rng)?;
            log::info!("simulated {}", simulation);
        }
    }
    Ok(())
}

/// One line per observation history: what it saw, what it does.
fn describe(policy: &JointPolicy, histories: &Histories) {
    for agent in 0..policy.agents() {
        println!("agent {}", agent);
        for stage in 0..policy.horizon() {
            for (history, action) in policy.stage(agent, stage).iter().enumerate() {
                println!("  {:?} → {}", histories.decode(agent, history, stage), action);
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    gmaa::log()?;
    let args = Args::parse();
    let settings = args.settings()?;
    let problem = args.problem()?;
    log::info!("planning {} over {} stages", problem.name(), settings.horizon);
    match args.heuristic {
        Estimate::Qmdp => run(&args, problem, settings, |p, h| Qmdp::new(p, h)),
        Estimate::Qpomdp => run(&args, problem, settings, |p, h| Qpomdp::new(p, h)),
        Estimate::Qbg => run(&args, problem, settings, |p, h| Qbg::new(p, h)),
        Estimate::Qhybrid => run(&args, problem, settings, |p, h| Qbg::hybrid(p, h, args.depth.min(h))),
    }
}
