use std::process;

use mirath_core::{GrandfatherPolicy, HijabKind, MadhhabRuleSet, MotherWithFather, RuleDatabase};

use crate::{report_error, OutputFormat};

pub(crate) fn cmd_rules(madhab: Option<&str>, output: OutputFormat, quiet: bool) {
    let database = RuleDatabase::classical();
    let sets: Vec<&MadhhabRuleSet> = match madhab {
        Some(code) => match database.rule_set_for_code(code) {
            Ok(set) => vec![set],
            Err(e) => {
                let msg = format!("error: {} ({})", e, e.code());
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        },
        None => database
            .madhabs()
            .filter_map(|m| database.rule_set_for(m).ok())
            .collect(),
    };

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let json_output = match sets.as_slice() {
                [single] if madhab.is_some() => serde_json::to_value(single),
                _ => serde_json::to_value(&sets),
            };
            println!(
                "{}",
                json_output
                    .and_then(|v| serde_json::to_string_pretty(&v))
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            for (i, set) in sets.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_rule_set(set);
            }
        }
    }
}

fn print_rule_set(set: &MadhhabRuleSet) {
    println!("{} (rules {})", set.madhab.name(), set.version);
    let grandfather = match set.grandfather_with_siblings {
        GrandfatherPolicy::Exclude => "excludes them",
        GrandfatherPolicy::Share => "shares with them",
    };
    let mother = match set.mother_with_father {
        MotherWithFather::ThirdOfRemainder => "third of the remainder",
        MotherWithFather::Sixth => "sixth",
    };
    println!("  Grandfather with siblings: {}", grandfather);
    println!("  Mother with father: {}", mother);
    println!("  Spouses join radd: {}", yes_no(set.spouse_radd));
    println!("  Shared uterine third: {}", yes_no(set.shared_uterine_third));
    println!("  Hijab rules ({}):", set.hijab_rules.len());
    for rule in &set.hijab_rules {
        let kind = match rule.kind {
            HijabKind::Complete => "complete",
            HijabKind::Partial(_) => "partial",
        };
        println!("    {:<8} {}", kind, rule.describe());
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
