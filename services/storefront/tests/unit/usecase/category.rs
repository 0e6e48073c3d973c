use storefront::error::AppErrorCode;
use storefront::model::CategoryModel;
use storefront::usecase::{CategoryService, ProductService};

use super::{ut_seed_category, ut_seed_product};
use crate::ut_setup_share_state;

#[tokio::test]
async fn hierarchy_exclude_orphan() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let apparel = ut_seed_category(&shr_state, "Apparel", None).await;
    let shoes = ut_seed_category(&shr_state, "Shoes", Some(apparel.id)).await;
    let lost = ut_seed_category(&shr_state, "Lost", Some(99)).await;
    let svc = CategoryService::new(&shr_state);
    let roots = svc.build_hierarchy().await.unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, apparel.id);
    assert_eq!(roots[0].children.len(), 1);
    assert_eq!(roots[0].children[0].id, shoes.id);
    assert!(roots[0].children[0].children.is_empty());

    let found = svc.find_category_by_id(shoes.id).await.unwrap().unwrap();
    assert_eq!(found.parent, Some(apparel.id));
    assert!(svc.find_category_by_id(lost.id).await.unwrap().is_none());
    let cmap = svc.category_map().await.unwrap();
    assert_eq!(cmap.len(), 3);
    let node = cmap.get(&apparel.id).unwrap();
    assert_eq!(node.children.len(), 1);
    assert_eq!(node.children[0].id, shoes.id);
    assert_eq!(cmap.get(&lost.id).unwrap().parent, Some(99));
    let lowest = svc.lowest_categories().await.unwrap();
    let ids = lowest.iter().map(|c| c.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![shoes.id, lost.id]);
    let parents = svc.parent_categories().await.unwrap();
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].name.as_str(), "Apparel");
}

#[tokio::test]
async fn add_refresh_hierarchy() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let svc = CategoryService::new(&shr_state);
    let home = svc.add("Home".to_string(), None).await.unwrap();
    let roots = svc.build_hierarchy().await.unwrap();
    assert!(roots[0].children.is_empty());
    let bath = svc.add("Bath".to_string(), Some(home.id)).await.unwrap();
    let roots = svc.build_hierarchy().await.unwrap();
    assert_eq!(roots[0].children[0].id, bath.id);
    let err = svc.add("Garden".to_string(), Some(404)).await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::NotFound);
}

#[tokio::test]
async fn update_reject_cycle() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let svc = CategoryService::new(&shr_state);
    let a = svc.add("Outdoor".to_string(), None).await.unwrap();
    let b = svc.add("Camping".to_string(), Some(a.id)).await.unwrap();
    let c = svc.add("Tents".to_string(), Some(b.id)).await.unwrap();

    let mut item = a.clone();
    item.parent = Some(a.id);
    let err = svc.update(item).await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::InvalidState);
    let mut item = a.clone();
    item.parent = Some(c.id);
    let err = svc.update(item).await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::InvalidState);
    let ghost = CategoryModel {
        id: 321,
        name: "Ghost".to_string(),
        parent: None,
    };
    let err = svc.update(ghost).await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::NotFound);

    // move Tents up to the root level
    let mut item = c.clone();
    item.parent = None;
    item.name = "Shelters".to_string();
    let saved = svc.update(item).await.unwrap();
    assert!(saved.parent.is_none());
    let roots = svc.build_hierarchy().await.unwrap();
    let names = roots.iter().map(|n| n.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Outdoor", "Shelters"]);
}

#[tokio::test]
async fn delete_reject_with_children() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let svc = CategoryService::new(&shr_state);
    let a = svc.add("Toys".to_string(), None).await.unwrap();
    let b = svc.add("Puzzles".to_string(), Some(a.id)).await.unwrap();
    let err = svc.delete(a.id).await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::InvalidState);
    svc.delete(b.id).await.unwrap();
    svc.delete(a.id).await.unwrap();
    assert!(svc.build_hierarchy().await.unwrap().is_empty());
    let err = svc.delete(a.id).await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::NotFound);
}

#[tokio::test]
async fn mutation_invalidate_product_listing() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let cat_svc = CategoryService::new(&shr_state);
    let prod_svc = ProductService::new(&shr_state);
    let books = cat_svc.add("Books".to_string(), None).await.unwrap();
    let _p = ut_seed_product(&shr_state, "Atlas", 22, Some(books.id)).await;
    assert_eq!(prod_svc.all().await.unwrap().len(), 1);
    // written behind the back of the services, cached listing is stale
    let _p = ut_seed_product(&shr_state, "Almanac", 18, Some(books.id)).await;
    assert_eq!(prod_svc.all().await.unwrap().len(), 1);
    let _c = cat_svc.add("Comics".to_string(), Some(books.id)).await.unwrap();
    assert_eq!(prod_svc.all().await.unwrap().len(), 2);
}
