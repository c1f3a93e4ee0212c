//! Generates a synthetic order-line CSV for benchmarks and manual runs.
//!
//! Usage: `data_generator [path] [rows]`

use rand::Rng;
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};

const STATES: [&str; 8] = ["SP", "RJ", "MG", "RS", "PR", "SC", "BA", "DF"];
const CATEGORIES: [&str; 6] = [
    "cama_mesa_banho",
    "beleza_saude",
    "esporte_lazer",
    "moveis_decoracao",
    "informatica_acessorios",
    "relogios_presentes",
];

fn main() {
    let mut args = env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "data/orders.csv".to_string());
    let rows: usize = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1_000_000);

    let file = File::create(&path).unwrap();
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "order_id,customer_id,customer_unique_id,seller_id,product_category_name,\
customer_state,seller_state,order_purchase_timestamp,payment_value"
    )
    .unwrap();

    let mut rng = rand::rng();
    for i in 0..rows {
        let customer = rng.random_range(0..rows / 3 + 1);
        let seller = rng.random_range(0..500);
        let category = CATEGORIES[rng.random_range(0..CATEGORIES.len())];
        let customer_state = STATES[rng.random_range(0..STATES.len())];
        let seller_state = STATES[rng.random_range(0..STATES.len())];
        let month = rng.random_range(1..=12u32);
        let day = rng.random_range(1..=28u32);
        let hour = rng.random_range(0..24u32);
        let value = rng.random_range(100..50_000) as f64 / 100.0;

        writeln!(
            writer,
            "o{i:08},c{customer:08},u{customer:08},s{seller:04},{category},\
{customer_state},{seller_state},2018-{month:02}-{day:02} {hour:02}:00:00,{value:.2}"
        )
        .unwrap();
    }

    println!("Sample CSV generated: {path}");
}
