//! Sparsity discovery on cartesian and unstructured grids.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracerflow::{
    CartesianGrid, GridTopology, TracerError, UnstructuredGrid, allocate_matrix, build_sparsity,
};

/// Cartesian grid with roughly a quarter of the cells deactivated.
fn random_grid(rng: &mut StdRng, dims: [usize; 3]) -> CartesianGrid {
    let n = dims.iter().product();
    let mut actnum: Vec<bool> = (0..n).map(|_| rng.gen_range(0.0..1.0) > 0.25).collect();
    actnum[0] = true;
    CartesianGrid::new(dims, [10.0, 10.0, 2.0])
        .unwrap()
        .with_actnum(&actnum)
        .unwrap()
}

#[test]
fn every_cell_couples_to_itself() {
    let mut rng = StdRng::seed_from_u64(1);
    for dims in [[1, 1, 1], [4, 3, 2], [7, 1, 5]] {
        let grid = random_grid(&mut rng, dims);
        let pattern = build_sparsity(&grid);
        assert_eq!(pattern.len(), grid.num_cells());
        for i in 0..grid.num_cells() {
            assert!(pattern.contains(i, i), "cell {i} misses its diagonal");
        }
    }
}

#[test]
fn face_stencil_gives_symmetric_pattern() {
    let mut rng = StdRng::seed_from_u64(2);
    let grid = random_grid(&mut rng, [5, 4, 3]);
    let pattern = build_sparsity(&grid);
    assert!(pattern.is_symmetric());
    for i in 0..pattern.len() {
        for &j in pattern.row(i) {
            assert!(pattern.contains(j, i));
        }
    }
}

#[test]
fn fully_active_box_has_face_neighbour_count() {
    let grid = CartesianGrid::new([3, 2, 2], [1.0; 3]).unwrap();
    let pattern = build_sparsity(&grid);
    // 12 diagonals plus both directions of every interior face
    let faces = 2 * 2 * 2 + 3 * 1 * 2 + 3 * 2 * 1;
    assert_eq!(pattern.nnz(), 12 + 2 * faces);
    let corner = grid.cartesian_id(0, 0, 0);
    assert_eq!(pattern.row(corner).len(), 4);
}

#[test]
fn inactive_cells_break_couplings() {
    let grid = CartesianGrid::new([3, 1, 1], [1.0; 3])
        .unwrap()
        .with_actnum(&[true, false, true])
        .unwrap();
    let pattern = build_sparsity(&grid);
    assert_eq!(pattern.nnz(), 2);
    assert!(!pattern.contains(0, 1));
}

#[test]
fn unstructured_faces_define_the_pattern() {
    let centroids = vec![[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let grid = UnstructuredGrid::new(centroids, &[(0, 1), (1, 2), (3, 0), (1, 0)]).unwrap();
    let pattern = build_sparsity(&grid);
    let rows: Vec<Vec<usize>> = (0..4).map(|i| pattern.row(i).iter().copied().collect()).collect();
    assert_eq!(rows, vec![vec![0, 1, 3], vec![0, 1, 2], vec![1, 2], vec![0, 3]]);
    assert!(pattern.is_symmetric());
}

#[test]
fn allocated_matrix_follows_pattern() {
    let mut rng = StdRng::seed_from_u64(5);
    let grid = random_grid(&mut rng, [4, 4, 2]);
    let pattern = build_sparsity(&grid);
    let a = allocate_matrix::<f64>(&pattern).unwrap();
    assert_eq!(a.nrows(), grid.num_cells());
    assert_eq!(a.nnz(), pattern.nnz());
    assert!(a.values().iter().all(|&v| v == 0.0));
    for i in 0..a.nrows() {
        let cols: Vec<usize> = pattern.row(i).iter().copied().collect();
        assert_eq!(a.row(i).0, cols.as_slice());
    }
}

#[test]
fn writing_outside_the_pattern_is_a_logic_error() {
    let grid = CartesianGrid::new([3, 1, 1], [1.0; 3]).unwrap();
    let mut a = allocate_matrix::<f64>(&build_sparsity(&grid)).unwrap();
    assert!(a.add_to(0, 1, -1.0).is_ok());
    assert!(matches!(a.add_to(0, 2, 1.0), Err(TracerError::Logic(_))));
    assert!(matches!(a.entry_mut(2, 0), Err(TracerError::Logic(_))));
    assert_eq!(a.get(0, 1), -1.0);
    a.set_zero();
    assert_eq!(a.get(0, 1), 0.0);
}
