#![deny(warnings)]

//! Headless CLI: build the default scenario, simulate a number of days and
//! print per-company results. Optionally saves or resumes a snapshot.

use anyhow::Result;
use sim_core::validate_catalogs;
use sim_runtime::{scenario, Game};
use tracing::info;
use tracing_subscriber::EnvFilter;

struct Args {
    days: u32,
    seed: u64,
    save: Option<String>,
    load: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args {
        days: 30,
        seed: 42,
        save: None,
        load: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--days" => args.days = it.next().and_then(|s| s.parse().ok()).unwrap_or(args.days),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()).unwrap_or(args.seed),
            "--save" => args.save = it.next(),
            "--load" => args.load = it.next(),
            _ => {}
        }
    }
    args
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args();
    info!(
        days = args.days,
        seed = args.seed,
        build = env!("GIT_SHA"),
        "starting CLI"
    );

    let mut game = match &args.load {
        Some(path) => Game::load(persistence::load_game(path)?)?,
        None => {
            let world = scenario::default_scenario(args.seed);
            validate_catalogs(&world.resources, &world.spacecraft_catalog)?;
            Game::new(world)
        }
    };

    game.run_days(args.days);

    println!(
        "World OK | date: {} | sectors: {} | companies: {} | spacecraft: {}",
        game.world.date,
        game.world.sectors.len(),
        game.world.companies.len(),
        game.world.spacecrafts.len()
    );
    for company in &game.world.companies {
        let ships = game
            .world
            .company_spacecrafts(&company.id)
            .filter(|c| {
                game.world
                    .description(&c.description)
                    .map(|d| !d.is_station)
                    .unwrap_or(false)
            })
            .count();
        let stations = game.world.company_spacecrafts(&company.id).count() - ships;
        let project = game
            .ai(&company.id)
            .and_then(|ai| ai.construction_project())
            .map(|p| p.station_description.0.as_str())
            .unwrap_or("-");
        println!(
            "{:<18} | money: {:>9} | ships: {:>2} | stations: {:>2} | value: {:>9} | project: {}",
            company.name,
            company.money,
            ships,
            stations,
            game.world.company_value(&company.id),
            project
        );
    }

    if let Some(path) = &args.save {
        persistence::save_game(&game.save(), path)?;
        println!("Saved to {path}");
    }

    Ok(())
}
