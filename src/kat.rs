/*!
# Flapflate: Length Limited Code Lengths.

Katajainen's boundary package-merge, used to turn symbol frequencies into
minimum-redundancy code lengths that never exceed a given number of bits.
*/

use crate::DeflateError;



#[derive(Debug, Clone, Copy)]
/// # Chain Node.
struct Node {
	/// # Weight.
	weight: u64,

	/// # Leaf Count.
	count: usize,

	/// # Tail (Pool Index).
	tail: Option<usize>,
}



/// # Node Pool.
///
/// Each list holds two "lookahead" chains, stored here as indices into a
/// shared node arena.
struct Pool<'a> {
	/// # Sorted Leaves (Frequency, Symbol).
	leaves: &'a [(u32, usize)],

	/// # Nodes.
	nodes: Vec<Node>,

	/// # Lists.
	lists: Vec<[usize; 2]>,
}

impl<'a> Pool<'a> {
	/// # New.
	fn new(leaves: &'a [(u32, usize)], max_bits: usize) -> Self {
		let nodes = vec![
			Node { weight: u64::from(leaves[0].0), count: 1, tail: None },
			Node { weight: u64::from(leaves[1].0), count: 2, tail: None },
		];
		Self { leaves, nodes, lists: vec![[0, 1]; max_bits] }
	}

	/// # Weight Sum of a List.
	fn weight_sum(&self, index: usize) -> u64 {
		let [a, b] = self.lists[index];
		self.nodes[a].weight + self.nodes[b].weight
	}

	/// # Boundary Package-Merge Step.
	///
	/// Add a new chain to the list at `index`, using either the next leaf or
	/// the combination of the two lookahead chains from the previous list.
	/// The latter case recurses downward to replace the chains it used up.
	fn boundary_pm(&mut self, index: usize) {
		let old = self.lists[index][1];
		let last_count = self.nodes[old].count;
		let leaf = self.leaves.get(last_count).map(|l| u64::from(l.0));

		if index == 0 {
			let Some(weight) = leaf else { return; };
			self.push(index, Node { weight, count: last_count + 1, tail: None });
			return;
		}

		let sum = self.weight_sum(index - 1);
		match leaf {
			Some(weight) if weight < sum => {
				let tail = self.nodes[old].tail;
				self.push(index, Node { weight, count: last_count + 1, tail });
			},
			_ => {
				let tail = Some(self.lists[index - 1][1]);
				self.push(index, Node { weight: sum, count: last_count, tail });

				self.boundary_pm(index - 1);
				self.boundary_pm(index - 1);
			},
		}
	}

	/// # Final Boundary Package-Merge Step.
	fn boundary_pm_final(&mut self, index: usize) {
		let last = self.lists[index][1];
		let last_count = self.nodes[last].count;
		let sum = self.weight_sum(index - 1);

		if self.leaves.get(last_count).is_some_and(|l| u64::from(l.0) < sum) {
			let tail = self.nodes[last].tail;
			self.push(index, Node { weight: 0, count: last_count + 1, tail });
		}
		else {
			self.nodes[last].tail = Some(self.lists[index - 1][1]);
		}
	}

	/// # Push Chain.
	///
	/// Rotate the lookaheads of list `index` and append `node`.
	fn push(&mut self, index: usize, node: Node) {
		let idx = self.nodes.len();
		self.nodes.push(node);
		let list = &mut self.lists[index];
		list[0] = list[1];
		list[1] = idx;
	}
}



/// # Length Limited Code Lengths.
///
/// Return a code length for each entry of `counts`, none longer than
/// `max_bits`. Symbols with a count of zero get a length of zero. If only one
/// or two symbols are used, each gets a length of one.
///
/// ## Errors
///
/// An error is returned if `max_bits` is too small to give every used symbol
/// its own code.
pub fn length_limited_code_lengths(counts: &[u32], max_bits: u8)
-> Result<Vec<u8>, DeflateError> {
	let mut lengths = vec![0_u8; counts.len()];

	// Frequency/symbol pairs, least frequent first; ties keep symbol order.
	let mut leaves: Vec<(u32, usize)> = counts.iter()
		.copied()
		.enumerate()
		.filter_map(|(i, c)| (c != 0).then_some((c, i)))
		.collect();

	let max_bits = usize::from(max_bits);
	match leaves.len() {
		0 => return Ok(lengths),
		1 | 2 => {
			for (_, i) in leaves { lengths[i] = 1; }
			return Ok(lengths);
		},
		n if max_bits < 2 || max_bits < usize::BITS as usize && (1 << max_bits) < n => {
			return Err(DeflateError::CorruptStream);
		},
		_ => {},
	}
	leaves.sort_unstable();

	// There's no point having more lists than leaves.
	let n = leaves.len();
	let max_bits = max_bits.min(n - 1);
	let mut pool = Pool::new(&leaves, max_bits);

	// We want 2n - 2 active chains in the last list; initialization gave us
	// two, and the final step adds the last.
	for _ in 0..2 * n - 5 { pool.boundary_pm(max_bits - 1); }
	pool.boundary_pm_final(max_bits - 1);

	// Walk the final chain to find how many leaves sit at each depth.
	let mut chain = Vec::with_capacity(max_bits);
	let mut next = Some(pool.lists[max_bits - 1][1]);
	while let Some(idx) = next {
		chain.push(pool.nodes[idx].count);
		next = pool.nodes[idx].tail;
	}

	let mut val = chain[0];
	for (value, stop) in (1_u8..).zip(chain.iter().skip(1).copied().chain(std::iter::once(0))) {
		while val > stop {
			lengths[leaves[val - 1].1] = value;
			val -= 1;
		}
	}

	Ok(lengths)
}

/// # Ensure Two Codes.
///
/// Some inflaters reject a tree with fewer than two codes, so if zero or
/// one lengths are set, flip the first unset one(s) to one.
pub(crate) fn ensure_two_codes(lengths: &mut [u8]) {
	let used = lengths.iter().filter(|&&l| l != 0).count();
	if used < 2 {
		for l in lengths.iter_mut().filter(|l| **l == 0).take(2 - used) { *l = 1; }
	}
}
