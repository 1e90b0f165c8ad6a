mod graph_invariants;
