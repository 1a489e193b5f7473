use super::evaluate;
use crate::Deadline;
use crate::Histories;
use crate::JointPolicy;
use crate::LocalPolicy;
use crate::Problem;
use crate::Result;
use crate::Utility;
use crate::policies;

/// The optimal joint policy by brute force over the whole policy space.
///
/// Only feasible for tiny problems. Fails with an overflow error when the
/// space cannot even be counted, and with a deadline error when it cannot
/// be enumerated in time.
pub fn exhaustive<P>(problem: &P, horizon: usize, deadline: Deadline) -> Result<(JointPolicy, Utility)>
where
    P: Problem + ?Sized,
{
    let histories = Histories::new(problem, horizon)?;
    let actions = (0..problem.agents()).map(|i| problem.actions(i)).collect::<Vec<_>>();
    let totals = (0..problem.agents()).map(|i| histories.total(i)).collect::<Vec<_>>();
    let space = policies(&actions, &totals)?;
    log::debug!("enumerating {} joint policies", space);
    let ref mut ticker = deadline.ticker("exhaustive enumeration");
    let unfold = |flat: &LocalPolicy| {
        JointPolicy::new(
            (0..problem.agents())
                .map(|i| {
                    (0..horizon)
                        .map(|t| {
                            let from = histories.offset(i, t);
                            flat.actions(i)[from..from + histories.count(i, t)].to_vec()
                        })
                        .collect()
                })
                .collect(),
        )
    };
    let mut flat = LocalPolicy::zeros(&totals);
    let mut best = (unfold(&flat), Utility::NEG_INFINITY);
    loop {
        ticker.tick()?;
        let policy = unfold(&flat);
        let value = evaluate(problem, &policy, horizon)?;
        if value > best.1 {
            best = (policy, value);
        }
        if !flat.advance(&actions) {
            break;
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecPomdp;
    use crate::PlanError;
    use crate::Shape;
    use std::time::Duration;

    #[test]
    fn tiger_horizon_two_optimum() {
        let (policy, value) = exhaustive(&DecPomdp::tiger(), 2, Deadline::none()).unwrap();
        assert!((value + 4.0).abs() < 1e-9);
        assert_eq!(policy.horizon(), 2);
    }

    #[test]
    fn oversized_spaces_overflow() {
        let problem = DecPomdp::random(Shape::uniform(2, 2, 4, 4), 1.0, 0).unwrap();
        assert!(matches!(
            exhaustive(&problem, 5, Deadline::none()),
            Err(PlanError::Overflow(_))
        ));
    }

    #[test]
    fn enumeration_respects_the_deadline() {
        let problem = DecPomdp::random(Shape::uniform(2, 2, 2, 2), 1.0, 0).unwrap();
        assert!(matches!(
            exhaustive(&problem, 2, Deadline::after(Duration::ZERO)),
            Err(PlanError::DeadlineExceeded { .. })
        ));
    }
}
