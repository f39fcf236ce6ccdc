use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Coherent 2D noise used by the seeder. Output lies roughly in `[-1, 1]`.
pub trait Noise2D {
    fn sample(&self, x: f32, y: f32) -> f32;
}

/// Seedable Perlin gradient noise.
#[derive(Clone, Debug)]
pub struct GradientNoise {
    perm: [u8; 512],
}

impl GradientNoise {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::from_rng(&mut rng)
    }

    pub fn from_rng<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut base: Vec<u8> = (0..=255).collect();
        base.shuffle(rng);
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = base[i & 255];
        }
        Self { perm }
    }

    #[inline]
    fn hash(&self, xi: usize, yi: usize) -> u8 {
        self.perm[self.perm[xi] as usize + yi]
    }
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

#[inline]
fn grad(hash: u8, x: f32, y: f32) -> f32 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

impl Noise2D for GradientNoise {
    fn sample(&self, x: f32, y: f32) -> f32 {
        let xf0 = x.floor();
        let yf0 = y.floor();
        let xi = (xf0 as i64 & 255) as usize;
        let yi = (yf0 as i64 & 255) as usize;
        let xf = x - xf0;
        let yf = y - yf0;

        let u = fade(xf);
        let v = fade(yf);

        let aa = self.hash(xi, yi);
        let ab = self.hash(xi, yi + 1);
        let ba = self.hash(xi + 1, yi);
        let bb = self.hash(xi + 1, yi + 1);

        let value = lerp(
            lerp(grad(aa, xf, yf), grad(ba, xf - 1.0, yf), u),
            lerp(grad(ab, xf, yf - 1.0), grad(bb, xf - 1.0, yf - 1.0), u),
            v,
        );
        value.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_field() {
        let n1 = GradientNoise::new(42);
        let n2 = GradientNoise::new(42);
        for i in 0..50 {
            let x = i as f32 * 0.37;
            let y = i as f32 * 0.11 + 3.0;
            assert_eq!(n1.sample(x, y), n2.sample(x, y));
        }
    }

    #[test]
    fn stays_in_unit_range_and_varies() {
        let n = GradientNoise::new(7);
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for y in 0..64 {
            for x in 0..64 {
                let v = n.sample(x as f32 * 0.13, y as f32 * 0.13);
                assert!((-1.0..=1.0).contains(&v));
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        assert!(lo < -0.1 && hi > 0.1, "noise too flat: {lo}..{hi}");
    }

    #[test]
    fn lattice_points_are_zero() {
        let n = GradientNoise::new(3);
        assert_eq!(n.sample(4.0, 9.0), 0.0);
    }
}
