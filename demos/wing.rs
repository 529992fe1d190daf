use wingshell::prelude::*;

#[cfg(feature = "serde")]
fn options() -> anyhow::Result<WingOptions> {
    match std::env::args().nth(1) {
        Some(path) => WingOptions::from_json_str(&std::fs::read_to_string(path)?),
        None => Ok(WingOptions::default()),
    }
}

#[cfg(not(feature = "serde"))]
fn options() -> anyhow::Result<WingOptions> {
    Ok(WingOptions::default())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let pipeline = WingPipeline::new(options()?);
    let artifacts = pipeline.run()?;
    pipeline.write_outputs(&artifacts)?;

    let model = &artifacts.model;
    println!("nodes: {}", model.num_nodes());
    println!("elements: {}", model.num_elements());
    println!("variables: {}", model.num_variables());
    println!("skin area: {:.4}", model.total_area()?);
    println!("skin mass: {:.4}", model.total_mass()?);
    Ok(())
}
