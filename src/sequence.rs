// Declarative step scheduler for scripted eye animations.
// A Sequence is an ordered list of (offset-ms, action) steps relative to a
// start timestamp; the engine advances all sequences once per update(), so a
// step firing at tick N is reflected in the same tick's redraw.

use std::ops::{Index, IndexMut};

use log::debug;

use crate::eyes::RoboEyes;
use crate::framebuffer::Surface;

pub type StepAction<S> = Box<dyn FnMut(&mut RoboEyes<S>)>;

// One scheduled action; fires exactly once per sequence run.
struct Step<S: Surface> {
    ms_timing: u64,
    done: bool,
    action: StepAction<S>,
}

pub struct Sequence<S: Surface> {
    name: String,
    start: Option<u64>,
    steps: Vec<Step<S>>,
}

impl<S: Surface> Sequence<S> {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: None,
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a step firing `ms_timing` after the sequence start.
    pub fn step(&mut self, ms_timing: u64, action: impl FnMut(&mut RoboEyes<S>) + 'static) {
        self.steps.push(Step {
            ms_timing,
            done: false,
            action: Box::new(action),
        });
    }

    /// Stamp `now_ms` as the origin and begin firing steps.
    pub fn start(&mut self, now_ms: u64) {
        self.start = Some(now_ms);
    }

    /// Back to idle: clear the origin and un-fire every step for replay.
    pub fn reset(&mut self) {
        self.start = None;
        for step in &mut self.steps {
            step.done = false;
        }
    }

    /// A sequence is done when every step has fired. A sequence that was
    /// never started also reports done; callers are expected to start()
    /// before polling.
    pub fn done(&self) -> bool {
        match self.start {
            None => true,
            Some(_) => self.steps.iter().all(|s| s.done),
        }
    }

    /// Fire every pending step whose offset has elapsed, in list order.
    pub fn update(&mut self, now_ms: u64, eyes: &mut RoboEyes<S>) {
        let Some(start) = self.start else {
            return;
        };
        for step in &mut self.steps {
            if step.done || now_ms.saturating_sub(start) < step.ms_timing {
                continue;
            }
            (step.action)(eyes);
            step.done = true;
            debug!("sequence {} fired step at +{} ms", self.name, step.ms_timing);
        }
    }
}

/// Collection of sequences, advanced together from the engine's update().
pub struct Sequences<S: Surface> {
    items: Vec<Sequence<S>>,
}

impl<S: Surface> Default for Sequences<S> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<S: Surface> Sequences<S> {
    pub fn add(&mut self, name: &str) -> &mut Sequence<S> {
        self.items.push(Sequence::new(name));
        self.items.last_mut().unwrap()
    }

    /// All member sequences done. Vacuously true for an empty collection or
    /// when no sequence has been started.
    pub fn done(&self) -> bool {
        self.items.iter().all(|s| s.done())
    }

    pub fn update(&mut self, now_ms: u64, eyes: &mut RoboEyes<S>) {
        for seq in &mut self.items {
            seq.update(now_ms, eyes);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<S: Surface> Index<usize> for Sequences<S> {
    type Output = Sequence<S>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<S: Surface> IndexMut<usize> for Sequences<S> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.items[index]
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::eyes::testing::test_engine;
    use crate::eyes::Mood;

    #[test]
    fn steps_fire_once_in_list_order() {
        let (mut eyes, ticks) = test_engine(10);
        let fired = Rc::new(RefCell::new(Vec::new()));

        let seq = eyes.sequences.add("order");
        for (tag, offset) in [(0u32, 100u64), (1, 100), (2, 50)] {
            let fired = fired.clone();
            seq.step(offset, move |_eyes| fired.borrow_mut().push(tag));
        }
        eyes.sequences[0].start(0);

        // Jump past every offset at once: all fire, in list order
        ticks.set(160);
        eyes.update();
        assert_eq!(*fired.borrow(), vec![0, 1, 2]);
        assert!(eyes.sequences.done());

        // Further updates fire nothing more
        ticks.set(400);
        eyes.update();
        assert_eq!(fired.borrow().len(), 3);
    }

    #[test]
    fn elapsed_offsets_gate_firing() {
        let (mut eyes, ticks) = test_engine(10);
        let fired = Rc::new(RefCell::new(Vec::new()));

        let seq = eyes.sequences.add("gate");
        for (tag, offset) in [(0u32, 100u64), (1, 100), (2, 50)] {
            let fired = fired.clone();
            seq.step(offset, move |_eyes| fired.borrow_mut().push(tag));
        }
        eyes.sequences[0].start(0);

        ticks.set(60);
        eyes.update();
        assert_eq!(*fired.borrow(), vec![2]);
        assert!(!eyes.sequences.done());

        ticks.set(160);
        eyes.update();
        assert_eq!(*fired.borrow(), vec![2, 0, 1]);
    }

    #[test]
    fn reset_allows_exact_replay() {
        let (mut eyes, ticks) = test_engine(10);
        let count = Rc::new(RefCell::new(0u32));

        let seq = eyes.sequences.add("replay");
        let count_in_step = count.clone();
        seq.step(50, move |_eyes| *count_in_step.borrow_mut() += 1);
        eyes.sequences[0].start(0);

        ticks.set(100);
        eyes.update();
        assert_eq!(*count.borrow(), 1);

        // Replay relative to a new origin
        eyes.sequences[0].reset();
        let restart = eyes.now_ms();
        eyes.sequences[0].start(restart);
        eyes.update(); // only 0 ms elapsed since the new origin
        assert_eq!(*count.borrow(), 1);

        ticks.set(restart + 50);
        eyes.update();
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn steps_mutate_the_engine_before_the_redraw() {
        let (mut eyes, ticks) = test_engine(10);
        let seq = eyes.sequences.add("mood");
        seq.step(0, |eyes| eyes.set_mood(Mood::Happy));
        eyes.sequences[0].start(0);

        ticks.set(100);
        eyes.update();
        assert_eq!(eyes.mood(), Mood::Happy);
    }

    #[test]
    fn never_started_sequences_report_done() {
        // Known sharp edge: done() cannot tell "never started" from
        // "finished", and an empty collection is vacuously done.
        let (mut eyes, _ticks) = test_engine(10);
        assert!(eyes.sequences.done());

        let seq = eyes.sequences.add("idle");
        seq.step(10, |_eyes| {});
        assert!(eyes.sequences.done());
        assert!(eyes.sequences[0].done());
        assert_eq!(eyes.sequences[0].name(), "idle");
        assert_eq!(eyes.sequences.len(), 1);

        eyes.sequences[0].start(0);
        assert!(!eyes.sequences[0].done());
    }
}
