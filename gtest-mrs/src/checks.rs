//! Structural checks: well-formedness, connectivity and headedness

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::mrs::{Arg, Mrs, Var, BODY_ROLE, INTRINSIC_ROLE};

impl Mrs {
    /// Every predication is labelled, every handle constraint links a hole
    /// to a label, and every handle argument resolves to a label or a
    /// constrained hole. Quantifier bodies are left unconstrained.
    pub fn is_well_formed(&self) -> bool {
        if self.eps.iter().any(|ep| ep.label.is_none()) {
            return false;
        }

        let holes: BTreeSet<&Var> = self.handle_args().chain(self.top.iter()).collect();
        for hc in &self.hcons {
            if !holes.contains(&hc.hi) || !self.is_label(&hc.lo) {
                return false;
            }
        }

        let resolves = |h: &Var| self.is_label(h) || self.qeq_target(h).is_some();
        if let Some(top) = &self.top {
            if !self.eps.is_empty() && !resolves(top) {
                return false;
            }
        }
        self.eps
            .iter()
            .flat_map(|ep| ep.args.iter())
            .filter(|(role, _)| role != BODY_ROLE)
            .filter_map(|(_, arg)| arg.as_var())
            .filter(|v| v.is_handle())
            .all(resolves)
    }

    /// All predications belong to one component of the graph whose edges are
    /// shared labels and shared variables (a hole and its qeq target count as
    /// the same handle).
    pub fn is_connected(&self) -> bool {
        if self.eps.len() <= 1 {
            return true;
        }

        let canonical = |v: &Var| -> Var {
            if v.is_handle() {
                if let Some(lo) = self.qeq_target(v) {
                    return lo.clone();
                }
            }
            v.clone()
        };

        let mut parent: Vec<usize> = (0..self.eps.len()).collect();
        let mut first_seen: HashMap<Var, usize> = HashMap::new();

        for (i, ep) in self.eps.iter().enumerate() {
            let vars = ep.label.iter().chain(ep.args.iter().filter_map(|(_, a)| a.as_var()));
            for var in vars {
                match first_seen.get(&canonical(var)) {
                    Some(&j) => union(&mut parent, i, j),
                    None => {
                        first_seen.insert(canonical(var), i);
                    }
                }
            }
        }

        let root = find(&mut parent, 0);
        (1..self.eps.len()).all(|i| find(&mut parent, i) == root)
    }

    /// Indices of predications reachable from the top by following handle
    /// arguments, argument variables to the predication they are the ARG0 of,
    /// shared labels, and from a predication to the quantifiers binding its
    /// ARG0.
    pub fn headed_nodes(&self) -> BTreeSet<usize> {
        let mut reached = BTreeSet::new();
        let Some(top) = &self.top else {
            return reached;
        };

        let mut queue: VecDeque<usize> = self.handle_targets(top).into_iter().collect();
        while let Some(i) = queue.pop_front() {
            if !reached.insert(i) {
                continue;
            }
            let ep = &self.eps[i];
            let mut next: Vec<usize> = Vec::new();

            if let Some(label) = &ep.label {
                next.extend(self.labelled(label));
            }

            for (role, arg) in &ep.args {
                let Arg::Var(var) = arg else { continue };
                if role == INTRINSIC_ROLE {
                    continue;
                }
                if var.is_handle() {
                    next.extend(self.handle_targets(var));
                } else {
                    next.extend(self.eps.iter().enumerate().filter_map(|(j, other)| {
                        (j != i && !other.is_quantifier() && other.intrinsic() == Some(var)).then_some(j)
                    }));
                }
            }

            if let Some(intrinsic) = ep.intrinsic() {
                next.extend(self.eps.iter().enumerate().filter_map(|(j, other)| {
                    (j != i && other.is_quantifier() && other.intrinsic() == Some(intrinsic)).then_some(j)
                }));
            }

            queue.extend(next.into_iter().filter(|j| !reached.contains(j)));
        }

        reached
    }

    /// Every predication is reachable from the top
    pub fn is_headed(&self) -> bool {
        self.headed_nodes().len() == self.eps.len()
    }
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra] = rb;
    }
}
