//! Walks a fresh catalog through add, update and delete.
//!
//! ```sh
//! cargo run --example pharmacy -- /tmp/pharmacy.json
//! ```

use anyhow::Result;
use product_catalog::{NewProduct, ProductManager, ProductPatch};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "products.json".to_string());
    let mut manager = ProductManager::new(path);
    manager.load().await?;

    let products = [
        NewProduct::new("Aspirina", "Alivio rapido para el dolor de cabeza y fiebre", 5.99, "aspirina.jpg", "FARM001", 100),
        NewProduct::new("Ibuprofeno", "Antiinflamatorio y analgesico", 7.49, "Ibuprofeno.jpg", "FARM002", 80),
        NewProduct::new("Paracetamol", "Alivia el dolor y reduce la fiebre", 4.99, "Paracetamol.jpg", "FARM003", 120),
        NewProduct::new("Vitamina C", "Suplemento de vitamina C para fortalecer el sistema inmunologico", 8.99, "VitaminaC.jpg", "FARM004", 60),
        NewProduct::new("Antiacido", "Alivia la acidez estomacal", 6.99, "Antiacido.jpg", "FARM005", 50),
    ];
    for product in products {
        manager.add(product).await?;
    }
    println!("all products: {}", serde_json::to_string_pretty(manager.get_all())?);

    manager.update(1, ProductPatch::default().price(899.99).stock(20)).await?;
    manager.delete(4).await?;
    println!("updated products: {}", serde_json::to_string_pretty(manager.get_all())?);
    Ok(())
}
