//! Step numbering checks the sequencer relies on but does not enforce.

use crate::core::types::Step;

/// Report numbering problems that make checkpoint skipping misbehave:
/// - step numbers must be > 0
/// - numbers must be strictly increasing
/// - numbers should be contiguous
///
/// Returned messages are warnings; the caller decides whether to stop.
pub fn plan_warnings(steps: &[Step]) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(first) = steps.first()
        && first.number == 0
    {
        warnings.push("step 0 can never run: checkpoint starts at 0".to_string());
    }

    for pair in steps.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        if right.number <= left.number {
            warnings.push(format!(
                "step {} follows step {}: numbers must increase",
                right.number, left.number
            ));
        } else if right.number != left.number + 1 {
            warnings.push(format!(
                "gap between step {} and step {}",
                left.number, right.number
            ));
        }
    }

    warnings
}
