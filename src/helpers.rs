/// Finalizer of the splitmix64 generator. Used to mix seed components into
/// well distributed, platform-independent 64 bit values.
#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Derive a seed from a base seed and an arbitrary list of components.
/// The result only depends on the inputs and their order.
pub fn derive_seed(base_seed: u64, components: &[u64]) -> u64 {
    components.iter()
        .fold(splitmix64(base_seed), |acc, &c| splitmix64(acc.rotate_left(17) ^ splitmix64(c)))
}

#[cfg(test)]
macro_rules! assert_approx_eq {
	($left: expr, $right: expr, $tol: expr) => ({
		match ($left, $right, $tol) {
			(left_val , right_val, tol_val) => {
				let delta = (left_val - right_val).abs();
				if !(delta < tol_val) {
					panic!(
						"assertion failed: `(left ≈ right)` \
						(left: `{}`, right: `{}`) \
						with ∆={:1.1e} (allowed ∆={:e})",
						left_val , right_val, delta, tol_val
					)
				}
			}
		}
	});
	($left: expr, $right: expr) => (assert_approx_eq!(($left), ($right), 1e-15))
}




#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn derive_seed_is_stable() {
		assert_eq!(derive_seed(42, &[1, 2, 3]), derive_seed(42, &[1, 2, 3]));
		assert_ne!(derive_seed(42, &[1, 2, 3]), derive_seed(42, &[1, 3, 2]));
		assert_ne!(derive_seed(42, &[1, 2, 3]), derive_seed(43, &[1, 2, 3]));
		assert_ne!(derive_seed(0, &[0]), derive_seed(0, &[]));
	}

	#[test]
	fn derive_seed_base_and_components_do_not_cancel() {
		assert_ne!(derive_seed(5, &[5]), derive_seed(99, &[99]));
		assert_ne!(derive_seed(4, &[8, 16, 7, 0]), derive_seed(8, &[4, 16, 7, 0]));
		assert_ne!(derive_seed(3, &[1]), derive_seed(1, &[3]));
	}

	#[test]
	fn derive_seed_spreads_neighbouring_inputs() {
		let seeds: std::collections::HashSet<u64> = (0..1000u64)
			.map(|t| derive_seed(7, &[4, 16, t]))
			.collect();
		assert_eq!(seeds.len(), 1000);
	}
}
