//! Compile `data/*_CODES.json` into `$OUT_DIR/builtins.rs`.

use std::fmt::Write as _;
use std::path::Path;
use std::{env, fs};

use serde::Deserialize;

#[derive(Deserialize)]
struct CodesFile {
    name: String,
    n_bits: u32,
    #[serde(default)]
    tau: Option<u32>,
    codes: Vec<u64>,
}

fn main() {
    let data_dir = Path::new("data");
    println!("cargo:rerun-if-changed=data");

    let mut files: Vec<_> = fs::read_dir(data_dir)
        .expect("data/ directory")
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("_CODES.json"))
        })
        .collect();
    files.sort();

    let mut out = String::new();
    let mut table = String::new();
    for path in &files {
        println!("cargo:rerun-if-changed={}", path.display());
        let raw = fs::read_to_string(path).expect("readable codes file");
        let file: CodesFile = serde_json::from_str(&raw)
            .unwrap_or_else(|e| panic!("{}: {e}", path.display()));
        assert!(
            file.n_bits <= 64,
            "{}: {} bits do not fit in u64",
            file.name,
            file.n_bits
        );

        let ident = format!("{}_CODES", file.name);
        writeln!(out, "pub const {ident}: &[u64] = &[").unwrap();
        for chunk in file.codes.chunks(8) {
            let line: Vec<String> = chunk.iter().map(|c| format!("0x{c:x}")).collect();
            writeln!(out, "    {},", line.join(", ")).unwrap();
        }
        writeln!(out, "];\n").unwrap();

        let tau = match file.tau {
            Some(t) => format!("Some({t})"),
            None => "None".to_string(),
        };
        writeln!(
            table,
            "    BuiltinDictionary {{ name: {:?}, n_bits: {}, tau: {tau}, codes: {ident} }},",
            file.name, file.n_bits
        )
        .unwrap();
    }

    writeln!(out, "pub const BUILTINS: &[BuiltinDictionary] = &[\n{table}];").unwrap();

    let dest = Path::new(&env::var("OUT_DIR").expect("OUT_DIR")).join("builtins.rs");
    fs::write(dest, out).expect("write builtins.rs");
}
