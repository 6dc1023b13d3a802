use clap::Parser;
use std::process::ExitCode;
use vscreen::geometry::{Direction, Vec2d};
use vscreen::{compute_layout, RelationMatrix};

#[derive(Debug, Parser)]
#[command(version, about = "Compute an optimal screen placement")]
struct Options {
    /// Screen sizes, one per screen (e.g. 1920x1080)
    #[arg(value_name = "WxH", required = true)]
    sizes: Vec<Vec2d>,

    /// Relative position of two screens, by index (directions: left right above under)
    #[arg(long = "constrain", value_name = "A:DIR:B")]
    constraints: Vec<String>,

    /// Minimum virtual screen size
    #[arg(long, value_name = "WxH", default_value = "0x0")]
    min_size: Vec2d,

    /// Maximum virtual screen size
    #[arg(long, value_name = "WxH", default_value = "32767x32767")]
    max_size: Vec2d,

    /// Sets log level: error warn info debug trace
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<log::Level>,
}

fn parse_constraint(text: &str, nb_screens: usize) -> Result<(usize, Direction, usize), anyhow::Error> {
    let mut fields = text.splitn(3, ':');
    let mut field = |name| {
        fields
            .next()
            .ok_or_else(|| anyhow::Error::msg(format!("constraint {:?}: missing {}", text, name)))
    };
    let lhs: usize = field("left screen index")?.parse()?;
    let direction: Direction = field("direction")?.parse().map_err(anyhow::Error::msg)?;
    let rhs: usize = field("right screen index")?.parse()?;
    for index in [lhs, rhs] {
        if index >= nb_screens {
            anyhow::bail!("constraint {:?}: screen index {} out of range", text, index);
        }
    }
    if lhs == rhs {
        anyhow::bail!("constraint {:?}: a screen cannot be placed relative to itself", text);
    }
    Ok((lhs, direction, rhs))
}

fn run(options: Options) -> Result<(), anyhow::Error> {
    let mut relations = RelationMatrix::new(options.sizes.len());
    for text in &options.constraints {
        let (lhs, direction, rhs) = parse_constraint(text, options.sizes.len())?;
        relations.set(lhs, rhs, Some(direction));
    }
    if !relations.is_single_connected_component() {
        log::warn!("constraints do not relate all screens together, placement is mostly penalty-driven");
    }

    let solution = compute_layout(options.min_size, options.max_size, &options.sizes, &relations)?
        .ok_or_else(|| anyhow::Error::msg("no feasible layout within the given bounds"))?;

    println!("virtual screen {}", solution.vscreen_size);
    for (index, (position, size)) in
        Iterator::zip(solution.positions.iter(), options.sizes.iter()).enumerate()
    {
        println!("screen {}: {} at ({}, {})", index, size, position.x, position.y);
    }
    Ok(())
}

fn main() -> ExitCode {
    let options = Options::parse();
    simple_logger::init_with_level(options.log_level.unwrap_or(log::Level::Warn))
        .expect("first logger set");
    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
