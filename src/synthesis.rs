//! Translation of a timeline into a Linear Temporal Logic formula.
//!
//! The formula is built by folding the timeline from its end towards its start. Writing `E` for
//! the formula of an event, `T` for the formula of a transition and `φ` for the formula built so
//! far, each step combines them as follows:
//!
//! | step                          | `φ` empty | `φ` not empty |
//! | ----------------------------- | --------- | ------------- |
//! | last transition, not empty    | `G(T)`    |               |
//! | event, not empty              | `E`       | `(E)&(X(φ))`  |
//! | transition, not empty         | `G(T)`    | `(T)U(φ)`     |
//! | transition, empty             |           | `F(φ)`        |
//!
//! Properties translate into comparisons of their variable, `t` for time, `[X]` for concentration
//! and `d[X]` for the derivative:
//!
//! ```rust
//! use ltl_annotator::config::FormulaSyntax;
//! use ltl_annotator::event::Event;
//! use ltl_annotator::synthesis::synthesize;
//! use ltl_annotator::timeline::Timeline;
//!
//! let mut timeline = Timeline::new();
//! timeline.add_event(Event::point(5.0, 10.0).unwrap()).unwrap();
//!
//! assert_eq!(synthesize(&timeline, &FormulaSyntax::default()), "F((t=5)&([X]=10))");
//! ```

use crate::config::FormulaSyntax;
use crate::event::Event;
use crate::property::{Bound, Property};
use crate::timeline::Timeline;
use crate::transition::Transition;

/// Builds formulas using the operators and variable names of a [`FormulaSyntax`].
#[derive(Debug, Clone, Copy)]
pub struct FormulaBuilder<'a> {
    syntax: &'a FormulaSyntax,
}

impl<'a> FormulaBuilder<'a> {
    pub fn new(syntax: &'a FormulaSyntax) -> Self {
        Self { syntax }
    }

    pub fn and(&self, left: &str, right: &str) -> String {
        format!("{}{}{}", self.parenthesise(left), self.syntax.and, self.parenthesise(right))
    }

    pub fn or(&self, left: &str, right: &str) -> String {
        format!("{}{}{}", self.parenthesise(left), self.syntax.or, self.parenthesise(right))
    }

    pub fn not(&self, formula: &str) -> String {
        format!("{}{}", self.syntax.not, self.parenthesise(formula))
    }

    pub fn next(&self, formula: &str) -> String {
        format!("{}{}", self.syntax.next, self.parenthesise(formula))
    }

    pub fn until(&self, condition: &str, release: &str) -> String {
        format!(
            "{}{}{}",
            self.parenthesise(condition),
            self.syntax.until,
            self.parenthesise(release)
        )
    }

    pub fn future(&self, formula: &str) -> String {
        format!("{}{}", self.syntax.future, self.parenthesise(formula))
    }

    pub fn globally(&self, formula: &str) -> String {
        format!("{}{}", self.syntax.globally, self.parenthesise(formula))
    }

    fn parenthesise(&self, formula: &str) -> String {
        format!("{}{}{}", self.syntax.left_parenthesis, formula, self.syntax.right_parenthesis)
    }

    /// Conjunction of all properties set on the event.
    pub fn event(&self, event: &Event) -> Option<String> {
        let parts = [
            self.positive(event.time(), &self.syntax.time),
            self.positive(event.concentration(), &self.syntax.concentration),
            self.cyclic(event.derivative(), &self.syntax.derivative),
        ];

        self.conjunction(parts)
    }

    /// Conjunction of all properties set on the transition.
    pub fn transition(&self, transition: &Transition) -> Option<String> {
        let parts = [
            self.positive(transition.concentration(), &self.syntax.concentration),
            self.cyclic(transition.derivative(), &self.syntax.derivative),
        ];

        self.conjunction(parts)
    }

    fn conjunction<const N: usize>(&self, parts: [Option<String>; N]) -> Option<String> {
        parts
            .into_iter()
            .flatten()
            .reduce(|formula, part| self.and(&formula, &part))
    }

    fn comparison(&self, variable: &str, operator: &str, value: f64) -> String {
        format!("{}{}{}", variable, operator, value)
    }

    /// Formula of a positive property, bounds that were not set are left out.
    pub fn positive(&self, property: &Property, variable: &str) -> Option<String> {
        if let Some(value) = property.point_value() {
            return Some(self.comparison(variable, &self.syntax.equals, value));
        }

        let lower = property
            .has_bound(Bound::Lower)
            .then(|| property.bound(Bound::Lower))
            .flatten()
            .map(|lower| self.comparison(variable, &self.syntax.greater, lower));

        let upper = property
            .has_bound(Bound::Upper)
            .then(|| property.bound(Bound::Upper))
            .flatten()
            .map(|upper| self.comparison(variable, &self.syntax.lesser, upper));

        match (lower, upper) {
            (Some(lower), Some(upper)) => Some(self.and(&lower, &upper)),
            (lower, upper) => lower.or(upper),
        }
    }

    /// Formula of a cyclic property, infinite bounds are left out. A lower bound greater than the
    /// upper one denotes the sector wrapping around, which translates into a disjunction.
    pub fn cyclic(&self, property: &Property, variable: &str) -> Option<String> {
        if let Some(value) = property.point_value() {
            return Some(self.comparison(variable, &self.syntax.equals, value));
        }

        let finite = |bound| property.bound(bound).filter(|value: &f64| value.is_finite());
        let lower = finite(Bound::Lower);
        let upper = finite(Bound::Upper);

        match (lower, upper) {
            (Some(low), Some(up)) => {
                let lower = self.comparison(variable, &self.syntax.greater, low);
                let upper = self.comparison(variable, &self.syntax.lesser, up);

                if up < low {
                    Some(self.or(&lower, &upper))
                } else {
                    Some(self.and(&lower, &upper))
                }
            }
            (Some(low), None) => Some(self.comparison(variable, &self.syntax.greater, low)),
            (None, Some(up)) => Some(self.comparison(variable, &self.syntax.lesser, up)),
            (None, None) => None,
        }
    }

    /// Fold the whole timeline into a single formula. The result is empty if nothing is set.
    pub fn timeline(&self, timeline: &Timeline) -> String {
        let events = timeline.events();
        let transitions = timeline.transitions();

        let mut formula = transitions
            .last()
            .and_then(|last| self.transition(last))
            .map(|last| self.globally(&last));

        for (event, transition) in events.iter().zip(transitions).rev() {
            if let Some(event) = self.event(event) {
                formula = Some(match formula {
                    Some(formula) => self.and(&event, &self.next(&formula)),
                    None => event,
                });
            }

            formula = match (self.transition(transition), formula) {
                (Some(transition), Some(formula)) => Some(self.until(&transition, &formula)),
                (Some(transition), None) => Some(self.globally(&transition)),
                (None, formula) => formula.map(|formula| self.future(&formula)),
            };
        }

        formula.unwrap_or_default()
    }
}

/// Synthesize the formula described by `timeline`.
pub fn synthesize(timeline: &Timeline, syntax: &FormulaSyntax) -> String {
    FormulaBuilder::new(syntax).timeline(timeline)
}

#[cfg(test)]
mod tests {
    use super::{synthesize, FormulaBuilder};
    use crate::config::FormulaSyntax;
    use crate::coordinates::Transformation;
    use crate::event::Event;
    use crate::property::{Bound, Property};
    use crate::timeline::{Timeline, TimelineError};

    #[test]
    fn empty_timeline() {
        assert_eq!(synthesize(&Timeline::new(), &FormulaSyntax::default()), "");
    }

    #[test]
    fn single_event() -> Result<(), TimelineError> {
        let mut timeline = Timeline::new();
        timeline.add_event(Event::point(5.0, 10.0)?)?;

        assert_eq!(synthesize(&timeline, &FormulaSyntax::default()), "F((t=5)&([X]=10))");
        Ok(())
    }

    #[test]
    fn two_events() -> Result<(), TimelineError> {
        let mut timeline = Timeline::new();
        timeline.add_event(Event::point(1.0, 5.0)?)?;
        timeline.add_event(Event::point(2.0, 6.0)?)?;

        assert_eq!(
            synthesize(&timeline, &FormulaSyntax::default()),
            "F(((t=1)&([X]=5))&(X(F((t=2)&([X]=6)))))"
        );
        Ok(())
    }

    #[test]
    fn transitions() -> Result<(), TimelineError> {
        let coord = Transformation::new(10.0, 10.0);
        let mut timeline = Timeline::new();
        timeline.add_event(Event::point(1.0, 5.0)?)?;

        timeline.select_transition(0, &coord)?;
        let mut first = timeline.transitions()[0];
        first.concentration_mut().set_bound(Bound::Upper, 3.0)?;
        timeline.modify_transition(first)?;

        timeline.select_transition(1, &coord)?;
        let mut last = timeline.transitions()[1];
        last.derivative_mut().set_bound(Bound::Lower, 0.5)?;
        timeline.modify_transition(last)?;

        assert_eq!(
            synthesize(&timeline, &FormulaSyntax::default()),
            "([X]<3)U(((t=1)&([X]=5))&(X(G(d[X]>0.5))))"
        );
        Ok(())
    }

    #[test]
    fn only_last_transition() -> Result<(), TimelineError> {
        let coord = Transformation::new(10.0, 10.0);
        let mut timeline = Timeline::new();

        timeline.select_transition(0, &coord)?;
        let mut transition = timeline.transitions()[0];
        transition.concentration_mut().set_bound(Bound::Lower, 2.0)?;
        timeline.modify_transition(transition)?;

        assert_eq!(synthesize(&timeline, &FormulaSyntax::default()), "G([X]>2)");
        Ok(())
    }

    #[test]
    fn positive_interval() -> Result<(), TimelineError> {
        let syntax = FormulaSyntax::default();
        let builder = FormulaBuilder::new(&syntax);

        let property = Property::positive_interval(2.5, 4.0)?;
        assert_eq!(builder.positive(&property, "t"), Some("(t>2.5)&(t<4)".to_string()));

        let mut property = Property::positive_interval(2.0, 3.0)?;
        property.unbind(Bound::Upper);
        assert_eq!(builder.positive(&property, "t"), Some("t>2".to_string()));

        let mut property = Property::positive_point(2.0)?;
        property.unbind(Bound::Upper);
        assert_eq!(builder.positive(&property, "t"), None);

        assert_eq!(builder.positive(&Property::positive(1.0)?, "t"), None);
        Ok(())
    }

    #[test]
    fn cyclic_wrap_around() -> Result<(), TimelineError> {
        let syntax = FormulaSyntax::default();
        let builder = FormulaBuilder::new(&syntax);

        let mut property = Property::cyclic(0.0);
        property.set_bound(Bound::Lower, 2.0)?;
        property.set_bound(Bound::Upper, -1.0)?;
        assert_eq!(builder.cyclic(&property, "d[X]"), Some("(d[X]>2)|(d[X]<-1)".to_string()));

        property.unbind(Bound::Lower);
        assert_eq!(builder.cyclic(&property, "d[X]"), Some("d[X]<-1".to_string()));
        Ok(())
    }

    #[test]
    fn event_with_derivative() -> Result<(), TimelineError> {
        let syntax = FormulaSyntax::default();
        let builder = FormulaBuilder::new(&syntax);

        let mut event = Event::point(3.0, 4.0)?;
        event.derivative_mut().make_point()?;

        assert_eq!(builder.event(&event), Some("((t=3)&([X]=4))&(d[X]=0)".to_string()));
        Ok(())
    }

    #[test]
    fn custom_syntax() -> Result<(), TimelineError> {
        let syntax = FormulaSyntax {
            and: " && ".to_string(),
            concentration: "x".to_string(),
            ..FormulaSyntax::default()
        };

        let mut timeline = Timeline::new();
        timeline.add_event(Event::point(5.0, 10.0)?)?;

        assert_eq!(synthesize(&timeline, &syntax), "F((t=5) && (x=10))");
        Ok(())
    }
}
