//! Structural comparison of MRSs

use std::collections::HashMap;

use crate::mrs::{Arg, ElementaryPredication, Mrs, Var};

/// Result of comparing two bags of MRSs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BagComparison {
    pub test_unique: usize,
    pub shared: usize,
    pub gold_unique: usize,
}

impl BagComparison {
    pub fn is_match(&self) -> bool {
        self.test_unique == 0 && self.gold_unique == 0
    }
}

/// Count items shared between two bags, matching each item at most once.
pub fn compare_bags(test: &[Mrs], gold: &[Mrs]) -> BagComparison {
    let mut used = vec![false; gold.len()];
    let mut shared = 0;

    for t in test {
        // isomorphism is an equivalence, so a greedy match is maximal
        let found = gold.iter().enumerate().find(|(j, g)| !used[*j] && is_isomorphic(t, g)).map(|(j, _)| j);
        if let Some(j) = found {
            used[j] = true;
            shared += 1;
        }
    }

    BagComparison { test_unique: test.len() - shared, shared, gold_unique: gold.len() - shared }
}

/// Whether `a` and `b` are equal up to a consistent renaming of variables
pub fn is_isomorphic(a: &Mrs, b: &Mrs) -> bool {
    if a.eps.len() != b.eps.len() || a.hcons.len() != b.hcons.len() || a.icons.len() != b.icons.len() {
        return false;
    }

    let mut mapping = Mapping::default();
    if !mapping.pair_opt(a.top.as_ref(), b.top.as_ref(), a, b)
        || !mapping.pair_opt(a.index.as_ref(), b.index.as_ref(), a, b)
    {
        return false;
    }

    let signatures_b: Vec<Signature> = b.eps.iter().map(signature).collect();
    let mut order: Vec<(usize, Signature, usize)> = a
        .eps
        .iter()
        .enumerate()
        .map(|(i, ep)| {
            let sig = signature(ep);
            let candidates = signatures_b.iter().filter(|s| **s == sig).count();
            (i, sig, candidates)
        })
        .collect();
    if order.iter().any(|(_, _, n)| *n == 0) {
        return false;
    }
    // most constrained first
    order.sort_by_key(|(i, _, n)| (*n, *i));

    let search = Search { a, b, order: &order, signatures_b: &signatures_b };
    let mut used = vec![false; b.eps.len()];
    search.eps(0, &mut used, mapping)
}

/// Predicate, constant argument and role layout of a predication
#[derive(Debug, Clone, PartialEq, Eq)]
struct Signature {
    predicate: String,
    roles: Vec<(String, Option<String>)>,
}

fn signature(ep: &ElementaryPredication) -> Signature {
    let mut roles: Vec<(String, Option<String>)> = ep
        .args
        .iter()
        .map(|(role, arg)| {
            let constant = match arg {
                Arg::Const(c) => Some(c.clone()),
                Arg::Var(_) => None,
            };
            (role.clone(), constant)
        })
        .collect();
    roles.sort();
    Signature { predicate: ep.normalized_predicate(), roles }
}

#[derive(Debug, Clone, Default)]
struct Mapping {
    forward: HashMap<Var, Var>,
    backward: HashMap<Var, Var>,
}

impl Mapping {
    fn pair(&mut self, va: &Var, vb: &Var, a: &Mrs, b: &Mrs) -> bool {
        if va.sort != vb.sort {
            return false;
        }
        match (self.forward.get(va), self.backward.get(vb)) {
            (Some(mapped), _) => return mapped == vb,
            (None, Some(_)) => return false,
            (None, None) => {}
        }
        if a.properties_of(va) != b.properties_of(vb) {
            return false;
        }
        self.forward.insert(va.clone(), vb.clone());
        self.backward.insert(vb.clone(), va.clone());
        true
    }

    fn pair_opt(&mut self, va: Option<&Var>, vb: Option<&Var>, a: &Mrs, b: &Mrs) -> bool {
        match (va, vb) {
            (Some(va), Some(vb)) => self.pair(va, vb, a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn pair_eps(&mut self, ea: &ElementaryPredication, eb: &ElementaryPredication, a: &Mrs, b: &Mrs) -> bool {
        if !self.pair_opt(ea.label.as_ref(), eb.label.as_ref(), a, b) {
            return false;
        }
        for (role, arg) in &ea.args {
            if let Arg::Var(va) = arg {
                match eb.arg(role) {
                    Some(Arg::Var(vb)) => {
                        if !self.pair(va, vb, a, b) {
                            return false;
                        }
                    }
                    _ => return false,
                }
            }
        }
        true
    }
}

struct Search<'a> {
    a: &'a Mrs,
    b: &'a Mrs,
    order: &'a [(usize, Signature, usize)],
    signatures_b: &'a [Signature],
}

impl Search<'_> {
    fn eps(&self, depth: usize, used: &mut [bool], mapping: Mapping) -> bool {
        let Some((i, sig, _)) = self.order.get(depth) else {
            return self.constraints(mapping);
        };
        let ea = &self.a.eps[*i];

        for (j, eb) in self.b.eps.iter().enumerate() {
            if used[j] || &self.signatures_b[j] != sig {
                continue;
            }
            let mut extended = mapping.clone();
            if !extended.pair_eps(ea, eb, self.a, self.b) {
                continue;
            }
            used[j] = true;
            if self.eps(depth + 1, used, extended) {
                return true;
            }
            used[j] = false;
        }
        false
    }

    fn constraints(&self, mapping: Mapping) -> bool {
        let hcons_a: Vec<Triple> = self.a.hcons.iter().map(|h| (&h.hi, format!("{:?}", h.relation), &h.lo)).collect();
        let hcons_b: Vec<Triple> = self.b.hcons.iter().map(|h| (&h.hi, format!("{:?}", h.relation), &h.lo)).collect();
        let icons_a: Vec<Triple> = self.a.icons.iter().map(|c| (&c.left, c.relation.clone(), &c.right)).collect();
        let icons_b: Vec<Triple> = self.b.icons.iter().map(|c| (&c.left, c.relation.clone(), &c.right)).collect();

        let mut used_h = vec![false; hcons_b.len()];
        let Some(mapping) = self.triples(&hcons_a, &hcons_b, 0, &mut used_h, mapping) else {
            return false;
        };
        let mut used_i = vec![false; icons_b.len()];
        self.triples(&icons_a, &icons_b, 0, &mut used_i, mapping).is_some()
    }

    fn triples(
        &self,
        left: &[Triple],
        right: &[Triple],
        depth: usize,
        used: &mut [bool],
        mapping: Mapping,
    ) -> Option<Mapping> {
        let Some((la, rel, ra)) = left.get(depth) else {
            return Some(mapping);
        };
        for (j, (lb, rel_b, rb)) in right.iter().enumerate() {
            if used[j] || rel != rel_b {
                continue;
            }
            let mut extended = mapping.clone();
            if !extended.pair(la, lb, self.a, self.b) || !extended.pair(ra, rb, self.a, self.b) {
                continue;
            }
            used[j] = true;
            if let Some(done) = self.triples(left, right, depth + 1, used, extended) {
                return Some(done);
            }
            used[j] = false;
        }
        None
    }
}

type Triple<'a> = (&'a Var, String, &'a Var);
