use std::error::Error;

use approx::assert_relative_eq;
use ltl_annotator::coordinates::Transformation;
use ltl_annotator::document::Document;
use ltl_annotator::editor::Editor;
use ltl_annotator::property::Bound;
use ltl_annotator::{synthesize, Event, FormulaSyntax, ModelChange, Property, Session, Timeline, TimelineContext};

fn canvas() -> Transformation {
    Transformation::new(100.0, 100.0)
}

/// Rise to 5 at time 1 while staying below 4, fall to 2 at time 3 and stay above 1 afterwards.
fn annotated_session() -> Result<Session, Box<dyn Error>> {
    let coord = canvas();
    let mut session = Session::default();

    session.apply(ModelChange::create_event(Event::point(1.0, 5.0)?))?;
    session.apply(ModelChange::create_event(Event::point(3.0, 2.0)?))?;

    let mut editor = session.select_transition(0, &coord)?;
    editor.drag_edge(Bound::Upper, 4.0)?;
    session.finish(Editor::Transition(editor))?;

    let mut editor = session.select_transition(1, &coord)?;
    editor.transition_mut().derivative_mut().set_bound(Bound::Upper, 0.0)?;
    session.finish(Editor::Transition(editor))?;

    let mut editor = session.select_transition(2, &coord)?;
    editor.drag_edge(Bound::Lower, 1.0)?;
    session.finish(Editor::Transition(editor))?;

    Ok(session)
}

const ANNOTATED: &str = "([X]<4)U(((t=1)&([X]=5))&(X((d[X]<0)U(((t=3)&([X]=2))&(X(G([X]>1)))))))";

#[test]
fn single_event() -> Result<(), Box<dyn Error>> {
    let mut timeline = Timeline::new();
    timeline.add_event(Event::point(5.0, 10.0)?)?;

    assert_eq!(synthesize(&timeline, &FormulaSyntax::default()), "F((t=5)&([X]=10))");
    Ok(())
}

#[test]
fn two_events() -> Result<(), Box<dyn Error>> {
    let mut timeline = Timeline::new();
    timeline.add_event(Event::point(2.0, 6.0)?)?;
    timeline.add_event(Event::point(1.0, 5.0)?)?;

    assert_eq!(
        synthesize(&timeline, &FormulaSyntax::default()),
        "F(((t=1)&([X]=5))&(X(F((t=2)&([X]=6)))))"
    );
    Ok(())
}

#[test]
fn annotated_transitions() -> Result<(), Box<dyn Error>> {
    let session = annotated_session()?;

    assert_eq!(session.synthesize(), ANNOTATED);
    assert_eq!(session.timeline().transitions().len(), session.timeline().events().len() + 1);
    Ok(())
}

#[test]
fn undo_everything() -> Result<(), Box<dyn Error>> {
    let mut session = annotated_session()?;

    while session.can_undo() {
        session.undo()?;
        assert_eq!(session.timeline().transitions().len(), session.timeline().events().len() + 1);
    }

    assert_eq!(session.synthesize(), "");
    assert_eq!(session.timeline(), &Timeline::new());

    while session.can_redo() {
        session.redo()?;
    }

    assert_eq!(session.synthesize(), ANNOTATED);
    Ok(())
}

#[test]
fn deleting_joins_transitions() -> Result<(), Box<dyn Error>> {
    let coord = canvas();
    let mut session = annotated_session()?;

    // The transitions around the second event only constrain the derivative and the lower bound
    // of the concentration, their join keeps both.
    let editor = session.select_event(1, &coord)?;
    session.delete(Editor::Event(editor))?;

    let joined = session.timeline().transitions()[1];
    assert_eq!(joined.concentration().bound(Bound::Lower), Some(1.0));
    assert_eq!(joined.derivative().bound(Bound::Upper), Some(0.0));
    assert_eq!(session.synthesize(), "([X]<4)U(((t=1)&([X]=5))&(X(G(([X]>1)&(d[X]<0)))))");

    session.undo()?;
    assert_eq!(session.synthesize(), ANNOTATED);
    Ok(())
}

#[test]
fn stored_formula_is_preserved() -> Result<(), Box<dyn Error>> {
    let session = annotated_session()?;

    let json = Document::from_timeline(session.timeline()).to_json()?;
    let loaded = Document::from_json(&json)?.to_timeline(TimelineContext::default())?;

    assert_eq!(synthesize(&loaded, &FormulaSyntax::default()), ANNOTATED);
    Ok(())
}

#[test]
fn positive_exceedance() -> Result<(), Box<dyn Error>> {
    let mut property = Property::positive_interval(2.0, 10.0)?;
    assert_relative_eq!(property.center(), 6.0);

    property.set_bound(Bound::Lower, 12.0)?;
    assert_eq!(property.point_value(), Some(10.0));
    assert_relative_eq!(property.center(), 10.0);
    Ok(())
}

#[test]
fn syntax_from_config() -> Result<(), Box<dyn Error>> {
    let config = ltl_annotator::Config::from_json(
        r#"{ "syntax": { "and": " and ", "future": "eventually ", "time": "time" } }"#,
    )?;
    let mut session = Session::new(config);
    session.apply(ModelChange::create_event(Event::point(5.0, 10.0)?))?;

    assert_eq!(session.synthesize(), "eventually ((time=5) and ([X]=10))");
    Ok(())
}
