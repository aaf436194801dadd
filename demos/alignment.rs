use cluster_accuracy::*;

fn main() {
    // Cluster 0 was split, clusters 1 and 2 were found with swapped labels
    let true_labels = [0, 0, 0, 0, 1, 1, 1, 2, 2, 2];
    let pred_labels = [0, 0, 1, 1, 2, 2, 2, 1, 1, 0];

    let confusion = ConfusionMatrix::build(&true_labels, &pred_labels, 3).unwrap();
    for (t, row) in confusion.to_rows().iter().enumerate() {
        println!("true {}: {:?}", t, row);
    }

    let result = align(&confusion).unwrap();
    let reference = align_exhaustive(&confusion).unwrap();
    assert_eq!(result, reference);

    for (pred, &truth) in result.mapping.as_slice().iter().enumerate() {
        println!("predicted {} -> true {}", pred, truth);
    }
    println!("Relabeled: {:?}", result.mapping.relabel(&pred_labels).unwrap());
    println!("Accuracy: {}/{} = {:.3}", result.matched, result.total, result.accuracy);
}
