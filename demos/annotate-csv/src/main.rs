use std::env;
use std::error::Error;

use ltl_annotator::editor::Editor;
use ltl_annotator::series::{SeriesFormat, TimeSeries};
use ltl_annotator::{Bound, Event, ModelChange, Property, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let path = env::args().nth(1).unwrap_or_else(|| "series.csv".to_string());
    let mut session = Session::default();
    let coord = session.load_series(&path, &SeriesFormat::csv(), WIDTH, HEIGHT)?;

    let series: &TimeSeries = session.series().ok_or("no series loaded")?;
    // Event times must be positive, a sample at time zero cannot be annotated
    let peak = series
        .iter()
        .copied()
        .filter(|point| point.time > 0.0)
        .max_by(|a, b| a.concentration.total_cmp(&b.concentration))
        .ok_or("series has no sample after time zero")?;

    info!(time = peak.time, concentration = peak.concentration, "annotating peak");

    // The peak is reached at a known time with a concentration within ten percent of the sample.
    let time = Property::positive_point(peak.time)?;
    let concentration = Property::positive_interval(peak.concentration * 0.9, peak.concentration * 1.1)?;
    let peak_event = Event::from_properties(time, concentration, Property::cyclic(0.0));
    session.apply(ModelChange::create_event(peak_event))?;

    for (index, bound) in [(0, Bound::Lower), (1, Bound::Upper)] {
        let mut editor = session.select_transition(index, &coord)?;
        editor.transition_mut().derivative_mut().set_bound(bound, 0.0)?;
        session.finish(Editor::Transition(editor))?;
    }

    println!("Peak annotation");
    println!("Formula: {}", session.synthesize());

    Ok(())
}
