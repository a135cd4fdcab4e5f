//! Kirimi Breaker headless runner
//!
//! Loads tuning and a stage, lets the autoplayer play one run at the fixed
//! timestep and prints the result. With `--all-stages` it keeps going
//! through the stage table, taking the first skill offered after each clear.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use kirimi_breaker::consts::SIM_DT;
use kirimi_breaker::sim::{AutoPlayer, AutoPlayerConfig, GameEvent, GamePhase, GameState, tick};
use kirimi_breaker::stage::{StageData, StageTable};
use kirimi_breaker::{Leaderboard, Tuning};

#[derive(Parser, Debug)]
#[command(about = "Play one Kirimi Breaker run with the autoplayer", version)]
struct Args {
    /// RNG seed for the simulation and the autoplayer
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Stage id to play (defaults to the first stage in the table)
    #[arg(long)]
    stage: Option<u32>,
    /// JSON array of stages
    #[arg(long)]
    stages: Option<PathBuf>,
    /// JSON tuning overrides
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// JSON leaderboard to load and update
    #[arg(long)]
    leaderboard: Option<PathBuf>,
    /// Give up after this much simulated time
    #[arg(long, default_value_t = 300.0)]
    max_seconds: f32,
    /// Autoplayer landing prediction error
    #[arg(long, default_value_t = 0.5)]
    error: f32,
    /// Play every stage in the table in order
    #[arg(long)]
    all_stages: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let tuning = match &args.tuning {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading tuning {}", path.display()))?;
            Tuning::from_json(&json)?
        }
        None => Tuning::default(),
    };

    let stages = match &args.stages {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading stages {}", path.display()))?;
            StageTable::from_json(&json)?
        }
        None => StageTable::default(),
    };
    let first = match args.stage {
        Some(id) => stages.get(id)?.clone(),
        None => stages.first().clone(),
    };
    let mut state = if args.all_stages {
        if args.stage.is_some() {
            log::warn!("--stage is ignored with --all-stages");
        }
        GameState::with_stages(args.seed, tuning, stages)?
    } else {
        GameState::with_stage(args.seed, tuning, &first)?
    };
    let mut stage = match &state.progress {
        Some(progress) => progress.current().clone(),
        None => first,
    };
    state.events.set_queue_enabled(false);
    state.events.subscribe(|event: &GameEvent| match event {
        GameEvent::BallLost { lives_remaining } => {
            log::info!("Ball lost ({} left)", lives_remaining)
        }
        GameEvent::ComboChanged { count, multiplier } if *count >= 5 => {
            log::info!("Combo {} (x{})", count, multiplier)
        }
        GameEvent::SkillAcquired(skill) => log::info!("Skill {:?}", skill),
        _ => {}
    });

    let config = AutoPlayerConfig {
        prediction_error: args.error,
        ..Default::default()
    };
    let mut bot = AutoPlayer::new(args.seed, config);

    log::info!("Kirimi Breaker (headless) starting stage {} \"{}\"", stage.id, stage.name);
    if !state.request_start() {
        anyhow::bail!("could not start stage {}", stage.id);
    }

    let max_ticks = (args.max_seconds / SIM_DT).ceil() as u64;
    loop {
        let started = state.time_ticks;
        while state.session.simulation_active() && state.time_ticks - started < max_ticks {
            let input = bot.next_input(&state, SIM_DT);
            tick(&mut state, &input, SIM_DT);
        }
        if !state.phase().is_terminal() {
            log::warn!("Stopped after {} simulated seconds without finishing", args.max_seconds);
        }
        report(&state, &stage, args.leaderboard.as_ref())?;

        if state.phase() != GamePhase::GameClear || !state.has_next_stage() {
            break;
        }
        if let Some(&skill) = state.request_skill_offer().first() {
            state.choose_skill(skill);
        }
        state.request_next_stage()?;
        if let Some(progress) = &state.progress {
            stage = progress.current().clone();
        }
        println!();
    }

    Ok(())
}

/// Print one stage result and record it on the leaderboard
fn report(state: &GameState, stage: &StageData, leaderboard: Option<&PathBuf>) -> Result<()> {
    let summary = state.summary();
    println!("Stage:   {} ({})", stage.name, stage.id);
    if let Some(progress) = &state.progress {
        println!("Progress: {}", progress.progress_text());
    }
    println!("Result:  {:?}", state.phase());
    println!("Score:   {}", summary.score);
    println!("Lives:   {}", summary.lives_remaining);
    println!(
        "Bricks:  {}/{} ({}%)",
        summary.destroyed_bricks,
        summary.total_bricks,
        summary.clear_percentage()
    );
    println!("Time:    {:.1}s left", summary.remaining_time);
    println!("Rank:    {}", summary.rank());

    if let Some(path) = leaderboard {
        let mut board = match fs::read_to_string(path) {
            Ok(json) => Leaderboard::from_json(&json)?,
            Err(_) => Leaderboard::new(),
        };
        match board.add(stage.id, summary) {
            Some(place) => println!("Leaderboard: #{}", place),
            None => println!("Leaderboard: did not place"),
        }
        fs::write(path, board.to_json()?)
            .with_context(|| format!("writing leaderboard {}", path.display()))?;
    }

    Ok(())
}
