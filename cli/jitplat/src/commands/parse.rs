//! `jitplat parse-visible`: parse a visible device list.

use anyhow::Result;
use jitplat_core::{parse_visible_device_list, AllowedDevices};

/// Parse `list` and print the allow-list it denotes.
pub fn run(list: &str) -> Result<()> {
    let allowed = parse_visible_device_list(list)?;
    println!("{}", describe(&allowed));
    Ok(())
}

fn describe(allowed: &AllowedDevices) -> String {
    match allowed {
        None => "all devices visible".to_string(),
        Some(ordinals) => {
            let list: Vec<String> = ordinals.iter().map(|o| o.to_string()).collect();
            format!("visible devices: {}", list.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_absent_list() {
        assert_eq!(describe(&parse_visible_device_list("").unwrap()), "all devices visible");
    }

    #[test]
    fn describes_sorted_ordinals() {
        let allowed = parse_visible_device_list("3, 1,1").unwrap();
        assert_eq!(describe(&allowed), "visible devices: 1, 3");
    }

    #[test]
    fn rejects_bad_entry() {
        let err = run("0,x").unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }
}
