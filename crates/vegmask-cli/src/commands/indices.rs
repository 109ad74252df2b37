//! Index listing command.

use anyhow::Result;
use vegmask::registry;

pub fn run() -> Result<()> {
    println!("{:<8} Name", "Key");
    println!("{:-<60}", "");
    for def in registry() {
        println!("{:<8} {}", def.key, def.display_name);
    }
    Ok(())
}
