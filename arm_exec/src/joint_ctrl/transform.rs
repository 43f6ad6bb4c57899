//! Coordinate transform from joint targets to actuator-native positions

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the actuator-native position that brings a joint's encoder reading
/// to the target.
///
/// The demanded encoder-space travel is the distance from the current
/// offset-corrected encoder reading to the target, scaled into the actuator's
/// native frame by the joint's gear ratio:
///
/// ```text
/// enc_distance = (target - (enc_meas - offset)) * ratio
/// act_target   = act_meas - enc_distance
/// ```
///
/// The correction is a pure function of its five inputs and is recomputed
/// from live feedback every cycle, so drift is corrected each cycle rather
/// than compounding.
pub fn act_target_pos(
    target_rot: f64,
    offset_rot: f64,
    enc_meas_rot: f64,
    act_meas: f64,
    ratio: f64,
) -> f64 {
    let enc_distance = (target_rot - (enc_meas_rot - offset_rot)) * ratio;
    act_meas - enc_distance
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_values() {
        // A joint 0.1 rotations short of its target with a ratio of 10 needs
        // the actuator to travel 1.0 in the negative native direction
        assert_eq!(act_target_pos(0.1, 0.0, 0.0, 5.0, 10.0), 4.0);

        // The offset shifts the encoder reading before the distance is taken
        assert_eq!(act_target_pos(0.0, 0.5, 0.5, 2.0, 10.0), 2.0);
    }

    #[test]
    fn test_converged_input_is_identity() {
        // If the corrected encoder reading already equals the target the
        // actuator is commanded to stay where it is
        let result = act_target_pos(0.25, 0.37, 0.62, 12.34, 131.75);
        assert!((result - 12.34).abs() < 1e-12);
    }

    proptest! {
        /// The transform is a pure function: identical inputs always yield
        /// identical outputs.
        #[test]
        fn transform_is_pure(
            target in -2.0..2.0f64,
            offset in -1.0..1.0f64,
            enc in -2.0..2.0f64,
            act in -100.0..100.0f64,
            ratio in 1.0..200.0f64,
        ) {
            let a = act_target_pos(target, offset, enc, act, ratio);
            let b = act_target_pos(target, offset, enc, act, ratio);
            prop_assert_eq!(a, b);
        }

        /// Moving the actuator to the computed position cancels the encoder
        /// error exactly.
        #[test]
        fn transform_cancels_encoder_error(
            target in -2.0..2.0f64,
            offset in -1.0..1.0f64,
            enc in -2.0..2.0f64,
            act in -100.0..100.0f64,
            ratio in 1.0..200.0f64,
        ) {
            let act_target = act_target_pos(target, offset, enc, act, ratio);

            // The actuator travel maps back to encoder space as -travel/ratio
            let enc_after = enc - (act_target - act) / ratio;
            prop_assert!((enc_after - offset - target).abs() < 1e-9);
        }
    }
}
