// Nodes of the builder frontier, before they are frozen.

use crate::outputs::Outputs;

/// Where a frontier arc leads.
#[derive(Debug)]
pub(crate) enum ArcTarget<T> {
    /// The next node on the frontier. Only the last arc of a frontier node
    /// points here.
    Frontier,
    /// A frozen node address, or one of the arc-less sentinels.
    Compiled(i64),
    /// A node kept open while pruning decides its fate.
    Pending(Box<UncompiledNode<T>>),
}

impl<T> ArcTarget<T> {
    /// Address of a compiled target.
    ///
    /// # Panics
    ///
    /// Panics if the target is still open; the builder freezes targets
    /// before their source.
    pub fn address(&self) -> i64 {
        match self {
            ArcTarget::Compiled(address) => *address,
            ArcTarget::Frontier | ArcTarget::Pending(_) => {
                unreachable!("arc target must be frozen before its source node")
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct BuilderArc<T> {
    pub label: i32,
    pub target: ArcTarget<T>,
    pub is_final: bool,
    pub output: T,
    pub next_final_output: T,
}

/// A node still on the frontier.
#[derive(Debug)]
pub(crate) struct UncompiledNode<T> {
    pub arcs: Vec<BuilderArc<T>>,
    pub is_final: bool,
    /// Final output, meaningful only when `is_final`.
    pub output: T,
    /// Number of inputs passing through this node.
    pub input_count: u64,
    /// Distance from the root.
    pub depth: usize,
}

impl<T: Clone + PartialEq> UncompiledNode<T> {
    pub fn new(depth: usize, no_output: T) -> Self {
        Self {
            arcs: Vec::new(),
            is_final: false,
            output: no_output,
            input_count: 0,
            depth,
        }
    }

    pub fn clear(&mut self, no_output: T) {
        self.arcs.clear();
        self.is_final = false;
        self.output = no_output;
        self.input_count = 0;
    }

    pub fn last_output(&self, label: i32) -> &T {
        let arc = self.last_arc(label);
        &arc.output
    }

    pub fn add_arc(&mut self, label: i32, no_output: T) {
        debug_assert!(
            self.arcs.last().is_none_or(|a| a.label < label),
            "arc labels must increase"
        );
        self.arcs.push(BuilderArc {
            label,
            target: ArcTarget::Frontier,
            is_final: false,
            output: no_output.clone(),
            next_final_output: no_output,
        });
    }

    pub fn replace_last(&mut self, label: i32, target: ArcTarget<T>, next_final_output: T, is_final: bool) {
        let arc = self.last_arc_mut(label);
        arc.target = target;
        arc.next_final_output = next_final_output;
        arc.is_final = is_final;
    }

    pub fn delete_last(&mut self, label: i32) {
        debug_assert_eq!(self.arcs.last().map(|a| a.label), Some(label));
        self.arcs.pop();
    }

    pub fn set_last_output(&mut self, label: i32, output: T) {
        self.last_arc_mut(label).output = output;
    }

    /// Prepends `prefix` to every arc output and to the final output.
    pub fn prepend_output<O: Outputs<Value = T>>(&mut self, outputs: &O, prefix: &T) {
        for arc in &mut self.arcs {
            arc.output = outputs.add(prefix, &arc.output);
        }
        if self.is_final {
            self.output = outputs.add(prefix, &self.output);
        }
    }

    fn last_arc(&self, label: i32) -> &BuilderArc<T> {
        let arc = self.arcs.last();
        debug_assert_eq!(arc.map(|a| a.label), Some(label));
        match arc {
            Some(arc) => arc,
            None => unreachable!("frontier node has no arc for label {label}"),
        }
    }

    fn last_arc_mut(&mut self, label: i32) -> &mut BuilderArc<T> {
        let arc = self.arcs.last_mut();
        debug_assert_eq!(arc.as_ref().map(|a| a.label), Some(label));
        match arc {
            Some(arc) => arc,
            None => unreachable!("frontier node has no arc for label {label}"),
        }
    }
}
