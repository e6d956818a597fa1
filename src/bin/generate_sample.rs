use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

/// Write synthetic three-lead VCG recordings named like the real dataset.
#[derive(Parser)]
#[command(name = "generate_sample")]
struct Args {
    /// Number of recordings to write
    #[arg(short = 'n', long, default_value_t = 20)]
    count: usize,

    /// Target directory
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn gaussian(t: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(t - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// One heartbeat sampled at `rows` points: P wave, QRS loop, T wave per lead.
fn generate_beat(
    rows: usize,
    leads: &[[(f64, f64, f64); 3]; 3],
    noise: f64,
    rng: &mut SimpleRng,
) -> Vec<[f64; 3]> {
    (0..rows)
        .map(|r| {
            let t = r as f64 / rows as f64;
            let mut sample = [0.0; 3];
            for (lead, waves) in leads.iter().enumerate() {
                let signal: f64 = waves
                    .iter()
                    .map(|&(mu, sigma, amp)| gaussian(t, mu, sigma, amp))
                    .sum();
                sample[lead] = signal + rng.gauss(0.0, noise);
            }
            sample
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `lo..hi`.
    fn range(&mut self, lo: usize, hi: usize) -> usize {
        lo + (self.next_u64() % (hi - lo) as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    // (centre, width, amplitude) of P, QRS and T per lead, on a 0..1 time axis
    let base: [[(f64, f64, f64); 3]; 3] = [
        [(0.15, 0.030, 0.10), (0.35, 0.015, 1.20), (0.65, 0.050, 0.30)],
        [(0.15, 0.030, 0.05), (0.37, 0.018, -0.60), (0.66, 0.050, 0.20)],
        [(0.16, 0.030, 0.08), (0.33, 0.020, 0.80), (0.64, 0.050, -0.25)],
    ];

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let mut total = 0usize;
    for index in 1..=args.count {
        let rows = rng.range(400, 800);
        let scale = 0.7 + 0.6 * rng.next_f64();
        let leads = base.map(|waves| waves.map(|(mu, sigma, amp)| (mu, sigma, amp * scale)));
        let beat = generate_beat(rows, &leads, 0.01, &mut rng);

        let mut body = String::with_capacity(rows * 3 * 12);
        for [x, y, z] in &beat {
            body.push_str(&format!("{x:.6}\t{y:.6}\t{z:.6}\n"));
        }

        let path = args.out_dir.join(format!("version{index:04}.txt"));
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        total += rows;
    }

    println!(
        "Wrote {} recordings ({total} samples, 3 leads) to {}",
        args.count,
        args.out_dir.display()
    );
    Ok(())
}
