use std::fmt::Write;
use std::path::{Path, PathBuf};

const CENTERS: [(&str, &str, [f64; 4]); 3] = [
    ("Adelie", "Torgersen", [38.8, 18.3, 190.0, 3700.0]),
    ("Chinstrap", "Dream", [48.8, 18.4, 196.0, 3730.0]),
    ("Gentoo", "Biscoe", [47.5, 15.0, 217.0, 5080.0]),
];
const SPREAD: [f64; 4] = [1.0, 0.4, 2.0, 120.0];

/// Palmerpenguins-style CSV: 50 complete rows per species plus two rows
/// with missing values.
pub fn penguins_csv() -> String {
    let mut csv = String::from(
        "species,island,bill_length_mm,bill_depth_mm,flipper_length_mm,body_mass_g,sex,year\n",
    );
    for (species, island, center) in CENTERS.iter() {
        for i in 0..50 {
            let mut values = [0.0; 4];
            for f in 0..4 {
                let offset = ((i * 7 + f * 3) % 11) as f64 - 5.0;
                values[f] = center[f] + SPREAD[f] * offset / 5.0;
            }
            let sex = if i % 2 == 0 { "male" } else { "female" };
            writeln!(
                csv,
                "{},{},{:.1},{:.1},{:.0},{:.0},{},2008",
                species, island, values[0], values[1], values[2], values[3], sex
            )
            .unwrap();
        }
    }
    csv.push_str("Adelie,Torgersen,NA,NA,NA,NA,NA,2007\n");
    csv.push_str("Gentoo,Biscoe,44.5,14.3,216,4100,,2007\n");
    csv
}

pub fn write_penguins_csv(dir: &Path) -> PathBuf {
    let path = dir.join("penguins.csv");
    std::fs::write(&path, penguins_csv()).unwrap();
    path
}
