use anyhow::{Context, Result, bail};

/// Resolve CLI seed tokens into numeric seeds, keeping order and dropping
/// repeats.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();
    for token in tokens {
        let seed = token
            .parse::<u64>()
            .with_context(|| format!("invalid seed '{token}': expected an unsigned integer"))?;
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        bail!("no seeds provided");
    }
    Ok(seeds)
}
