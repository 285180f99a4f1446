//! Strongly connected components over a dense adjacency list.

/// Tarjan's algorithm, iterative so deep dependency chains cannot overflow
/// the call stack.
///
/// Nodes are `0..adjacency.len()`. Each component is sorted ascending and
/// components are ordered by their smallest node.
pub fn strongly_connected_components(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut tarjan = Tarjan::new(adjacency.len());
    for root in 0..adjacency.len() {
        if tarjan.index[root].is_none() {
            tarjan.run(adjacency, root);
        }
    }

    let mut components = tarjan.components;
    for component in &mut components {
        component.sort_unstable();
    }
    components.sort_by_key(|c| c[0]);
    components
}

struct Tarjan {
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    components: Vec<Vec<usize>>,
}

impl Tarjan {
    fn new(n: usize) -> Self {
        Self {
            index: vec![None; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            next_index: 0,
            components: Vec::new(),
        }
    }

    fn open(&mut self, node: usize) {
        self.index[node] = Some(self.next_index);
        self.lowlink[node] = self.next_index;
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack[node] = true;
    }

    fn run(&mut self, adjacency: &[Vec<usize>], root: usize) {
        // (node, next successor position)
        let mut calls: Vec<(usize, usize)> = vec![(root, 0)];
        self.open(root);

        while let Some(frame) = calls.last_mut() {
            let node = frame.0;
            if let Some(&next) = adjacency[node].get(frame.1) {
                frame.1 += 1;
                match self.index[next] {
                    None => {
                        self.open(next);
                        calls.push((next, 0));
                    }
                    Some(next_index) if self.on_stack[next] => {
                        self.lowlink[node] = self.lowlink[node].min(next_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            calls.pop();
            if let Some(&(parent, _)) = calls.last() {
                self.lowlink[parent] = self.lowlink[parent].min(self.lowlink[node]);
            }

            if Some(self.lowlink[node]) == self.index[node] {
                let mut component = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack[member] = false;
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                self.components.push(component);
            }
        }
    }
}
