use serde::Serialize;

use crate::error::CliError;

pub fn render<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    println!("{}", to_json(value, pretty)?);
    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_and_pretty_forms_differ_only_in_whitespace() {
        let value = serde_json::json!({ "instrument": "XAU/USD", "status": "no_signal" });

        let compact = to_json(&value, false).expect("serializable");
        let pretty = to_json(&value, true).expect("serializable");

        assert!(!compact.contains('\n'));
        assert!(pretty.contains('\n'));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&pretty).expect("valid json"),
            value
        );
    }
}
