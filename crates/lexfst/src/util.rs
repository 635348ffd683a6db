// Lookups and diagnostics built on arc navigation.

use std::collections::VecDeque;
use std::io::Write;

use hashbrown::HashSet;
use lexfst_core::InputType;

use crate::Result;
use crate::fst::{ARCS_FOR_BINARY_SEARCH, Fst, FstArc};
use crate::outputs::{Outputs, PositiveIntOutputs};

/// Output of `input`, or `None` if the FST does not accept it.
pub fn get<O: Outputs>(fst: &Fst<O>, input: &[i32]) -> Result<Option<O::Value>> {
    let outputs = fst.outputs();
    let mut r = fst.bytes_reader();
    let mut arc = fst.first_arc();
    let mut next = FstArc::new(outputs.no_output());
    let mut output = outputs.no_output();
    for &label in input {
        if !fst.find_target_arc(label, &arc, &mut next, &mut r)? {
            return Ok(None);
        }
        std::mem::swap(&mut arc, &mut next);
        output = outputs.add(&output, arc.output());
    }
    Ok(arc
        .is_final()
        .then(|| outputs.add(&output, arc.next_final_output())))
}

/// Input whose output is `target`, for an FST built with ordinal outputs
/// (each input's output larger than the one before). Returns `None` when no
/// input maps to `target`.
pub fn get_by_output(fst: &Fst<PositiveIntOutputs>, target: u64) -> Result<Option<Vec<i32>>> {
    let mut r = fst.bytes_reader();
    let mut arc = fst.first_arc();
    let mut output = 0u64;
    let mut input = Vec::new();
    loop {
        if arc.is_final() {
            let final_output = output + arc.next_final_output();
            if final_output == target {
                return Ok(Some(input));
            }
            if final_output > target {
                return Ok(None);
            }
        }
        if !arc.target_has_arcs() {
            return Ok(None);
        }
        let node = arc.target();
        fst.read_first_real_target_arc(node, &mut arc, &mut r)?;

        if arc.node_flags() == ARCS_FOR_BINARY_SEARCH {
            // Arc outputs grow with the label; find the last arc whose
            // minimum reachable output is <= target.
            let mut candidate = arc.clone();
            let (mut low, mut high) = (0, arc.num_arcs() - 1);
            let mut exact = None;
            while low <= high {
                let mid = (low + high) >> 1;
                fst.read_arc_by_index(&mut candidate, &mut r, mid)?;
                let min_output = output + candidate.output();
                match min_output.cmp(&target) {
                    std::cmp::Ordering::Equal => {
                        exact = Some(mid);
                        break;
                    }
                    std::cmp::Ordering::Less => low = mid + 1,
                    std::cmp::Ordering::Greater => high = mid - 1,
                }
            }
            let idx = match exact {
                Some(idx) => idx,
                None if high < 0 => return Ok(None),
                None => high,
            };
            fst.read_arc_by_index(&mut arc, &mut r, idx)?;
        } else {
            let mut prev: Option<FstArc<u64>> = None;
            loop {
                let min_output = output + arc.output();
                if min_output == target || (min_output < target && arc.is_last()) {
                    break;
                }
                if min_output > target {
                    match prev.take() {
                        Some(p) => {
                            arc = p;
                            break;
                        }
                        None => return Ok(None),
                    }
                }
                prev = Some(arc.clone());
                fst.read_next_real_arc(&mut arc, &mut r)?;
            }
        }
        input.push(arc.label());
        output += arc.output();
    }
}

fn format_label(input_type: InputType, label: i32) -> String {
    match u8::try_from(label) {
        Ok(b) if input_type == InputType::Byte1 && b.is_ascii_graphic() && b != b'"' && b != b'\\' => {
            (b as char).to_string()
        }
        _ => match char::from_u32(label as u32) {
            Some(c) if input_type != InputType::Byte1 && !c.is_control() && c != '"' && c != '\\' => c.to_string(),
            _ => format!("0x{label:x}"),
        },
    }
}

/// Writes the FST as a Graphviz digraph. Real nodes are named by address;
/// the arc-less terminal states share one double-circled `end` node.
/// Final arcs are drawn bold, with their final output after `/F:`.
pub fn to_dot<O: Outputs, W: Write + ?Sized>(fst: &Fst<O>, out: &mut W) -> Result<()> {
    let outputs = fst.outputs();
    let mut r = fst.bytes_reader();
    let first = fst.first_arc();

    writeln!(out, "digraph FST {{")?;
    writeln!(out, "  rankdir = LR;")?;
    writeln!(out, "  initial [shape=point color=white label=\"\"];")?;
    writeln!(out, "  end [shape=doublecircle label=\"\"];")?;

    let start = if first.target_has_arcs() {
        first.target().to_string()
    } else {
        "end".to_string()
    };
    match fst.empty_output() {
        Some(empty) => writeln!(
            out,
            "  initial -> {start} [style=bold label=\"/F:{}\"];",
            outputs.output_to_string(empty)
        )?,
        None => writeln!(out, "  initial -> {start};")?,
    }

    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    if first.target_has_arcs() {
        seen.insert(first.target());
        queue.push_back(first.target());
    }
    let mut arc = FstArc::new(outputs.no_output());
    while let Some(node) = queue.pop_front() {
        writeln!(out, "  {node} [shape=circle label=\"{node}\"];")?;
        fst.read_first_real_target_arc(node, &mut arc, &mut r)?;
        loop {
            let target = if arc.target_has_arcs() {
                if seen.insert(arc.target()) {
                    queue.push_back(arc.target());
                }
                arc.target().to_string()
            } else {
                "end".to_string()
            };
            let mut label = format_label(fst.input_type(), arc.label());
            if !outputs.is_no_output(arc.output()) {
                label.push('/');
                label.push_str(&outputs.output_to_string(arc.output()));
            }
            let mut style = "";
            if arc.is_final() {
                style = " style=bold";
                if !outputs.is_no_output(arc.next_final_output()) {
                    label.push_str("/F:");
                    label.push_str(&outputs.output_to_string(arc.next_final_output()));
                }
            }
            writeln!(out, "  {node} -> {target} [label=\"{label}\"{style}];")?;
            if arc.is_last() {
                break;
            }
            fst.read_next_real_arc(&mut arc, &mut r)?;
        }
    }
    writeln!(out, "}}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FstBuilder;
    use lexfst_core::bytes_to_labels;

    fn ordinal_fst(words: &[&str]) -> Fst<PositiveIntOutputs> {
        let mut b = FstBuilder::new(InputType::Byte1, PositiveIntOutputs);
        for (ord, w) in words.iter().enumerate() {
            b.add_str(w, ord as u64).unwrap();
        }
        b.finish().unwrap().unwrap()
    }

    #[test]
    fn reverse_lookup_by_ordinal() {
        let mut words: Vec<String> = (0..40).map(|i| format!("w{:03}", i * 3)).collect();
        words.extend(["x", "xa", "xab", "y"].map(String::from));
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let fst = ordinal_fst(&refs);
        for (ord, w) in refs.iter().enumerate() {
            let found = get_by_output(&fst, ord as u64).unwrap();
            assert_eq!(found, Some(bytes_to_labels(w.as_bytes())), "ordinal {ord}");
        }
        assert_eq!(get_by_output(&fst, refs.len() as u64).unwrap(), None);
    }

    #[test]
    fn reverse_lookup_with_empty_input() {
        let fst = ordinal_fst(&["", "a", "b"]);
        assert_eq!(get_by_output(&fst, 0).unwrap(), Some(vec![]));
        assert_eq!(get_by_output(&fst, 2).unwrap(), Some(vec![i32::from(b'b')]));
    }

    #[test]
    fn dot_output_lists_every_arc() {
        let fst = ordinal_fst(&["ab", "ac", "b\"q"]);
        let mut dot = Vec::new();
        to_dot(&fst, &mut dot).unwrap();
        let dot = String::from_utf8(dot).unwrap();
        assert!(dot.starts_with("digraph FST {"));
        assert!(dot.trim_end().ends_with('}'));
        assert_eq!(dot.matches(" -> ").count(), 1 + 6);
        assert!(dot.contains("label=\"0x22"));
        assert!(dot.contains("style=bold"));
    }
}
