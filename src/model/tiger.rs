//! The "two doors, one tiger" benchmark.
//!
//! Two agents stand in front of two doors. A tiger hides behind one and a
//! treasure behind the other. Listening costs 1 per agent and yields a
//! private observation that is correct with probability 0.85. Opening a
//! door resets the tiger uniformly at random.
//!
//! | value | state | action | observation |
//! |-------|-------|--------|-------------|
//! | 0     | left  | listen | hear left   |
//! | 1     | right | open L | hear right  |
//! | 2     |       | open R |             |
use super::DecPomdp;
use crate::Probability;
use crate::Utility;

const LEFT: usize = 0;
const LISTEN: usize = 0;
const OPEN_LEFT: usize = 1;
const OPEN_RIGHT: usize = 2;
const ACCURACY: Probability = 0.85;

impl DecPomdp {
    /// Dec-Tiger with discount 1 and a uniform initial belief.
    pub fn tiger() -> Self {
        let states = 2;
        let joint = |a: usize, b: usize| 3 * a + b;
        let split = |ja: usize| (ja / 3, ja % 3);
        let transitions = (0..states)
            .flat_map(|s| (0..9).flat_map(move |ja| (0..states).map(move |s2| (s, ja, s2))))
            .map(|(s, ja, s2)| match ja == joint(LISTEN, LISTEN) {
                true if s == s2 => 1.0,
                true => 0.0,
                false => 0.5,
            })
            .collect();
        let emissions = (0..9)
            .flat_map(|ja| (0..states).flat_map(move |s2| (0..4).map(move |jo| (ja, s2, jo))))
            .map(|(ja, s2, jo)| match ja == joint(LISTEN, LISTEN) {
                true => hear(s2, jo / 2) * hear(s2, jo % 2),
                false => 0.25,
            })
            .collect();
        let rewards = (0..states)
            .flat_map(|s| (0..9).map(move |ja| (s, ja)))
            .map(|(s, ja)| {
                let (a, b) = split(ja);
                reward(s, a, b)
            })
            .collect();
        Self {
            name: "dectiger".to_string(),
            states,
            actions: vec![3, 3],
            observations: vec![2, 2],
            discount: 1.0,
            initial: vec![0.5, 0.5],
            transitions,
            emissions,
            rewards,
        }
    }
}

fn hear(state: usize, observation: usize) -> Probability {
    match state == observation {
        true => ACCURACY,
        false => 1.0 - ACCURACY,
    }
}

/// Reward with the tiger behind the left door; the right door mirrors it.
fn reward(state: usize, a: usize, b: usize) -> Utility {
    let mirror = |x: usize| match x {
        OPEN_LEFT => OPEN_RIGHT,
        OPEN_RIGHT => OPEN_LEFT,
        x => x,
    };
    let (a, b) = match state == LEFT {
        true => (a, b),
        false => (mirror(a), mirror(b)),
    };
    match (a, b) {
        (LISTEN, LISTEN) => -2.0,
        (LISTEN, OPEN_LEFT) | (OPEN_LEFT, LISTEN) => -101.0,
        (LISTEN, OPEN_RIGHT) | (OPEN_RIGHT, LISTEN) => 9.0,
        (OPEN_LEFT, OPEN_LEFT) => -50.0,
        (OPEN_RIGHT, OPEN_RIGHT) => 20.0,
        _ => -100.0,
    }
}
