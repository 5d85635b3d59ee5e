//! Prometheus text exposition (format 0.0.4).

use crate::telemetry::Measurement;
use std::collections::HashMap;
use std::fmt::Write;

/// Content type of [`render`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render measurements, grouping samples of one family together.
///
/// Families appear in order of first occurrence; samples keep their
/// relative order within a family.
pub fn render(measurements: &[Measurement]) -> String {
    let mut families: Vec<Vec<&Measurement>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for m in measurements {
        let slot = *index.entry(m.name()).or_insert_with(|| {
            families.push(Vec::new());
            families.len() - 1
        });
        families[slot].push(m);
    }

    let mut output = String::new();
    for family in &families {
        let Some(first) = family.first() else { continue };
        let desc = first.desc();
        output.push_str("# HELP ");
        output.push_str(desc.name);
        output.push(' ');
        push_escaped(&mut output, desc.help, false);
        let _ = writeln!(output, "\n# TYPE {} {}", desc.name, desc.kind);
        for m in family {
            write_sample(&mut output, m);
        }
    }
    output
}

fn write_sample(output: &mut String, m: &Measurement) {
    output.push_str(m.name());
    let mut labels = m.labels().peekable();
    if labels.peek().is_some() {
        output.push('{');
        for (i, (key, value)) in labels.enumerate() {
            if i > 0 {
                output.push(',');
            }
            output.push_str(key);
            output.push_str("=\"");
            push_escaped(output, value, true);
            output.push('"');
        }
        output.push('}');
    }
    output.push(' ');
    push_value(output, m.value());
    output.push('\n');
}

/// Backslash and newline are escaped everywhere, double quotes only inside
/// label values.
fn push_escaped(output: &mut String, text: &str, in_label: bool) {
    for c in text.chars() {
        match c {
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '"' if in_label => output.push_str("\\\""),
            c => output.push(c),
        }
    }
}

/// `Display` for `f64` already drops the fraction of integral values.
fn push_value(output: &mut String, v: f64) {
    if v.is_nan() {
        output.push_str("NaN");
    } else if v.is_infinite() {
        output.push_str(if v > 0.0 { "+Inf" } else { "-Inf" });
    } else {
        let _ = write!(output, "{}", v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::derived;
    use crate::telemetry::descriptors as d;

    fn rx(guest: &str, value: f64) -> Measurement {
        Measurement::new(&d::IFACE_RX_BYTES, value, vec![guest.to_string(), "vnet0".to_string()])
    }

    #[test]
    fn test_render_unlabeled() {
        let output = render(&[derived::up(true)]);
        assert!(output
            .contains("# HELP libvirt_up Whether scraping libvirt's metrics was successful."));
        assert!(output.contains("# TYPE libvirt_up gauge"));
        assert!(output.contains("\nlibvirt_up 1\n"));
    }

    #[test]
    fn test_render_groups_families() {
        let output = render(&[rx("vm1", 1.0), derived::up(true), rx("vm2", 2.5)]);
        let family = "# TYPE libvirt_domain_interface_stats_receive_bytes_total counter";
        assert_eq!(output.matches(family).count(), 1);

        let vm1 = output.find("domain=\"vm1\"").unwrap();
        let vm2 = output.find("domain=\"vm2\"").unwrap();
        let up = output.find("# HELP libvirt_up").unwrap();
        assert!(vm1 < vm2 && vm2 < up);
        assert!(output.contains(
            "libvirt_domain_interface_stats_receive_bytes_total\
             {domain=\"vm2\",target_device=\"vnet0\"} 2.5"
        ));
    }

    fn escaped(text: &str, in_label: bool) -> String {
        let mut out = String::new();
        push_escaped(&mut out, text, in_label);
        out
    }

    fn value(v: f64) -> String {
        let mut out = String::new();
        push_value(&mut out, v);
        out
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escaped("hello\\world", true), "hello\\\\world");
        assert_eq!(escaped("say \"hi\"", true), "say \\\"hi\\\"");
        assert_eq!(escaped("say \"hi\"", false), "say \"hi\"");
        assert_eq!(escaped("line1\nline2", false), "line1\\nline2");
    }

    #[test]
    fn test_values() {
        assert_eq!(value(2_097_152.0), "2097152");
        assert_eq!(value(0.5), "0.5");
        assert_eq!(value(-1.0), "-1");
        assert_eq!(value(f64::NAN), "NaN");
        assert_eq!(value(f64::INFINITY), "+Inf");
        assert_eq!(value(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn test_label_value_with_quote_renders_escaped() {
        let m = Measurement::new(
            &d::IFACE_RX_BYTES,
            1.0,
            vec!["vm \"a\"".to_string(), "vnet0".to_string()],
        );
        assert!(render(&[m]).contains(r#"{domain="vm \"a\"",target_device="vnet0"} 1"#));
    }
}
