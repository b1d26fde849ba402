use mrlcheck_core::error::MrlError;
use mrlcheck_core::limits::catalog;

pub fn list() -> Result<(), MrlError> {
    let catalog = catalog::load_builtin()?;

    println!("{} (v{})\n", catalog.name, catalog.version);
    if let Some(ref desc) = catalog.description {
        println!("{}\n", desc);
    }

    let max_name = catalog
        .products
        .iter()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(10);

    println!("  {:<width$}  {:<8}  Lookup id", "Product", "Code", width = max_name);
    for p in &catalog.products {
        println!(
            "  {:<width$}  {:<8}  {}",
            p.name,
            p.code,
            p.product_id,
            width = max_name
        );
    }
    Ok(())
}
