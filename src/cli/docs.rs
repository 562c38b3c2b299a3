//! Reference text for the exhibit CLI

use std::fmt::Write;

use crate::Registry;

/// Get the syntax overview
pub fn get_syntax_overview() -> &'static str {
    r#"EXHIBIT EXPRESSIONS

Expressions read values out of an item database. A path starts at a root
(`value` unless named) and hops along properties.

PATHS
  .label              Forward hop: labels of the current item
  !author             Backward hop: items whose author is the current item
  .@child             Forward hop keeping duplicates, in order
  !@cites             Backward hop keeping duplicates, in order
  index.year          Path starting from the root named `index`

LITERALS
  42  3.5             Numbers
  "text"  'text'      Strings; \" and \' escape quotes

OPERATORS (tightest first)
  *  /                Arithmetic; operands read as numbers
  +  -
  =  <>  <  <=  >  >= Comparison; `=` and `<>` compare exactly

  Operators apply to every pair of values from both sides.

CALLS
  count(.child)       Function call; arguments evaluated first
  if(.done, "y", "n") Control call; decides what to evaluate

Run 'exhibit functions' to list registered functions and controls.
"#
}

fn write_section(out: &mut String, title: &str, names: &[&str]) {
    let _ = writeln!(out, "{}", title);
    for name in names {
        let _ = writeln!(out, "  {}", name);
    }
    out.push('\n');
}

/// List everything registered in `registry`
pub fn get_registry_overview(registry: &Registry) -> String {
    let mut out = String::new();
    write_section(&mut out, "CONTROLS", &registry.control_names());
    write_section(&mut out, "FUNCTIONS", &registry.function_names());
    write_section(&mut out, "OPERATORS", &registry.operator_symbols());
    out
}
