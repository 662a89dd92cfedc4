use clap::{Parser, Subcommand};

use tidal_core::{
    BreathCoachController, CoachConfig, PhaseDurations, PhaseMachine, BANDS,
};

#[derive(Parser)]
#[command(name = "tidal-cli", about = "Offline simulator for the breathing coach")]
struct Cli {
    /// Optional TOML config file for controller tunables.
    #[arg(long)]
    config: Option<String>,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stress band table.
    Bands {},
    /// Compute a one-shot plan for a given stress probability.
    Plan {
        /// Stress probability in [0, 1].
        stress: f32,
        /// Planning window in seconds.
        #[arg(long, default_value_t = 60)]
        window: u32,
    },
    /// Feed a synthetic stress trace through the controller and print the
    /// resulting mode transitions and plans.
    Simulate {
        /// Trace length in seconds.
        #[arg(long, default_value_t = 120)]
        seconds: u32,
        /// Stress at the start of the trace.
        #[arg(long, default_value_t = 0.1)]
        from: f32,
        /// Stress at the end of the trace.
        #[arg(long, default_value_t = 0.9)]
        to: f32,
        /// Drop the face from the frame during this second, opening a
        /// freeze window.
        #[arg(long)]
        drop_face_at: Option<u32>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => CoachConfig::from_file_with_env(path)?,
        None => CoachConfig::default(),
    };

    match cli.cmd {
        Commands::Bands {} => {
            println!("mode       range            inhale hold  exhale hold");
            for band in &BANDS {
                let p = band.pattern;
                println!(
                    "{:<10} [{:.2}, {:.2})     {:>4.1}s {:>4.1}s {:>5.1}s {:>4.1}s",
                    band.mode.to_string(),
                    band.lo,
                    band.hi,
                    p.inhale,
                    p.hold_in,
                    p.exhale,
                    p.hold_out
                );
            }
        }
        Commands::Plan { stress, window } => {
            let coach = BreathCoachController::with_config(cfg);
            coach.push_face_stress(Some("cli"), stress, true, "ok");
            let plan = coach.plan(Some("cli"), Some(window));
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Simulate {
            seconds,
            from,
            to,
            drop_face_at,
        } => {
            simulate(cfg, seconds, from, to, drop_face_at);
        }
    }
    Ok(())
}

/// Drive the controller with a linear stress ramp at 1 Hz, printing each mode
/// transition, then run the final plan through a phase machine.
fn simulate(cfg: CoachConfig, seconds: u32, from: f32, to: f32, drop_face_at: Option<u32>) {
    const SEC_US: i64 = 1_000_000;
    let coach = BreathCoachController::with_config(cfg);
    let uid = Some("sim");
    let t0: i64 = 1_000_000 * SEC_US;

    let mut last_mode = None;
    for i in 0..seconds {
        let now = t0 + i64::from(i) * SEC_US;
        let frac = if seconds > 1 {
            i as f32 / (seconds - 1) as f32
        } else {
            0.0
        };
        let stress = from + (to - from) * frac;

        if drop_face_at == Some(i) {
            coach.push_face_stress_at(uid, stress, false, "no_face", now);
        } else {
            coach.push_face_stress_at(uid, stress, true, "ok", now);
        }

        let plan = coach.plan_at(uid, Some(60), now);
        if last_mode != Some(plan.mode) {
            println!(
                "t={:>4}s stress={:.2} smoothed={:.3} -> {} ({} cycles/min, {})",
                i, stress, plan.stress_smoothed, plan.mode, plan.cycles, plan.signal_quality
            );
            last_mode = Some(plan.mode);
        }
    }

    // Run one guided minute at the final pace.
    let end = t0 + i64::from(seconds) * SEC_US;
    let plan = coach.plan_at(uid, Some(60), end);
    println!(
        "final plan: {}: {} ({} cycles in {}s)",
        plan.mode, plan.affirmation, plan.cycles, plan.window_sec
    );
    let mut machine = PhaseMachine::new(PhaseDurations::from_pattern(&plan.phase_pattern()));
    let mut elapsed = 0u64;
    while machine.cycles_completed() < u64::from(plan.cycles) {
        let (entered, _) = machine.tick(500_000);
        elapsed += 500_000;
        for phase in entered {
            println!("  {:>5.1}s {}", elapsed as f32 / 1e6, phase.wire_label());
        }
    }
}
